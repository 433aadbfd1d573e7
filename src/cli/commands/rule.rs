//! Rule CLI commands.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use uuid::Uuid;

use crate::cli::display::{
    colorize_active, colorize_component_type, list_table, render_list, DetailView,
};
use crate::cli::open_engine;
use crate::cli::output::{output, truncate, ActionOutput, CommandOutput};
use crate::domain::models::{ComponentRecord, Config, EventRef, Rule};
use crate::domain::ports::{ContextValues, RuleFilter};

#[derive(Args, Debug)]
pub struct RuleArgs {
    #[command(subcommand)]
    pub command: RuleCommands,
}

#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// List rules
    List {
        /// Only rules of this event (entity_type:id)
        #[arg(long, value_parser = parse_event_ref)]
        event: Option<EventRef>,
        /// Only rules of this trigger
        #[arg(long)]
        trigger: Option<String>,
        /// Only active rules
        #[arg(long)]
        active: bool,
    },
    /// Show a rule and its components
    Show { id: Uuid },
    /// Create a rule
    Create {
        /// Owning event (entity_type:id)
        #[arg(long, value_parser = parse_event_ref)]
        event: EventRef,
        /// Trigger name
        #[arg(long)]
        trigger: String,
        /// Condition as plugin_id=JSON, repeatable, evaluated in order
        #[arg(long = "condition", value_parser = parse_component_spec)]
        conditions: Vec<(String, Value)>,
        /// Action as plugin_id=JSON, repeatable, executed in order
        #[arg(long = "action", value_parser = parse_component_spec)]
        actions: Vec<(String, Value)>,
        /// Create the rule inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Activate a rule
    Activate { id: Uuid },
    /// Deactivate a rule
    Deactivate { id: Uuid },
    /// Delete a rule, its components and schedules
    Delete { id: Uuid },
    /// Evaluate a rule's conditions with an empty context
    Evaluate { id: Uuid },
}

fn parse_event_ref(s: &str) -> Result<EventRef, String> {
    EventRef::parse(s).ok_or_else(|| format!("expected entity_type:id, got '{s}'"))
}

fn parse_component_spec(s: &str) -> Result<(String, Value), String> {
    let (plugin_id, json) = s.split_once('=').unwrap_or((s, "{}"));
    if plugin_id.is_empty() {
        return Err("plugin id cannot be empty".to_string());
    }
    let configuration = serde_json::from_str(json).map_err(|e| format!("invalid JSON for {plugin_id}: {e}"))?;
    Ok((plugin_id.to_string(), configuration))
}

#[derive(Debug, serde::Serialize)]
pub struct ComponentOutput {
    pub id: Option<String>,
    pub component_type: String,
    pub plugin_id: String,
    pub configuration: Value,
}

impl From<&ComponentRecord> for ComponentOutput {
    fn from(component: &ComponentRecord) -> Self {
        Self {
            id: component.id.map(|id| id.to_string()),
            component_type: component.component_type().to_string(),
            plugin_id: component.plugin_id.clone(),
            configuration: component.configuration.clone(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct RuleOutput {
    pub id: Option<String>,
    pub event: String,
    pub trigger: String,
    pub active: bool,
    pub components: Vec<ComponentOutput>,
    pub created_at: String,
}

impl From<&Rule> for RuleOutput {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.map(|id| id.to_string()),
            event: rule.event.to_string(),
            trigger: rule.trigger.clone(),
            active: rule.active,
            components: rule.components().map(ComponentOutput::from).collect(),
            created_at: rule.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct RuleListOutput {
    pub rules: Vec<RuleOutput>,
    pub total: usize,
}

impl CommandOutput for RuleListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "event", "trigger", "state", "components"]);
        for rule in &self.rules {
            table.add_row(vec![
                rule.id.as_deref().map_or_else(|| "-".to_string(), |id| truncate(id, 11)),
                rule.event.clone(),
                truncate(&rule.trigger, 30),
                colorize_active(rule.active).to_string(),
                rule.components.len().to_string(),
            ]);
        }
        render_list("rule", &table, self.total)
    }
}

impl CommandOutput for RuleOutput {
    fn to_human(&self) -> String {
        let mut view = DetailView::new(&format!("Rule {}", self.id.as_deref().unwrap_or("(unsaved)")))
            .field("Event", &self.event)
            .field("Trigger", &self.trigger)
            .field("State", &colorize_active(self.active).to_string())
            .field("Created", &self.created_at)
            .section("Components");
        for component in &self.components {
            view = view.item(&format!(
                "{} {} {}",
                colorize_component_type(&component.component_type),
                component.plugin_id,
                component.configuration
            ));
        }
        view.render()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct EvaluationOutput {
    pub id: String,
    pub passed: bool,
}

impl CommandOutput for EvaluationOutput {
    fn to_human(&self) -> String {
        if self.passed {
            format!("Rule {} conditions pass", self.id)
        } else {
            format!("Rule {} conditions do not pass", self.id)
        }
    }
}

pub async fn execute(args: RuleArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = open_engine(config).await?;
    let rules = engine.rules();

    match args.command {
        RuleCommands::List { event, trigger, active } => {
            let filter = RuleFilter {
                event,
                trigger,
                active: active.then_some(true),
            };
            let found = rules.find_rules(&filter).await?;
            output(
                &RuleListOutput {
                    total: found.len(),
                    rules: found.iter().map(RuleOutput::from).collect(),
                },
                json_mode,
            );
        }

        RuleCommands::Show { id } => {
            let rule = rules.get_rule(id).await?.with_context(|| format!("Rule not found: {id}"))?;
            output(&RuleOutput::from(&rule), json_mode);
        }

        RuleCommands::Create {
            event,
            trigger,
            conditions,
            actions,
            inactive,
        } => {
            if trigger.trim().is_empty() {
                bail!("Trigger cannot be empty");
            }
            let mut rule = Rule::new(event, trigger).with_active(!inactive);
            for (plugin_id, configuration) in conditions {
                rule.add_component(ComponentRecord::condition(plugin_id, configuration));
            }
            for (plugin_id, configuration) in actions {
                rule.add_component(ComponentRecord::action(plugin_id, configuration));
            }
            rules.save_rule(&mut rule).await?;
            output(&RuleOutput::from(&rule), json_mode);
        }

        RuleCommands::Activate { id } => {
            rules.set_active(id, true).await?;
            output(&ActionOutput::ok(format!("Rule {id} activated")), json_mode);
        }

        RuleCommands::Deactivate { id } => {
            rules.set_active(id, false).await?;
            output(&ActionOutput::ok(format!("Rule {id} deactivated")), json_mode);
        }

        RuleCommands::Delete { id } => {
            rules.delete_rule(id).await?;
            output(&ActionOutput::ok(format!("Rule {id} deleted")), json_mode);
        }

        RuleCommands::Evaluate { id } => {
            let rule = rules.get_rule(id).await?.with_context(|| format!("Rule not found: {id}"))?;
            let passed = rule.evaluate_conditions(engine.plugins(), &ContextValues::new());
            output(
                &EvaluationOutput {
                    id: id.to_string(),
                    passed,
                },
                json_mode,
            );
        }
    }

    Ok(())
}
