//! Event type and default rule template commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tokio::fs;

use crate::cli::commands::rule::RuleOutput;
use crate::cli::display::{list_table, render_list, DetailView};
use crate::cli::open_engine;
use crate::cli::output::{output, ActionOutput, CommandOutput};
use crate::domain::models::{
    Config, EventEntity, EventRef, EventType, RuleTemplate, REGISTRATION_TRIGGER,
};

#[derive(Args, Debug)]
pub struct EventTypeArgs {
    #[command(subcommand)]
    pub command: EventTypeCommands,
}

#[derive(Subcommand, Debug)]
pub enum EventTypeCommands {
    /// List event types
    List,
    /// Show one event type
    Show { entity_type: String, bundle: String },
    /// Create or replace event types from a YAML file (one document or a list)
    Import { file: PathBuf },
    /// Delete an event type and its rule templates
    Delete { entity_type: String, bundle: String },
    /// Manage default rule templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Save an event's default rules as its own rules
    Promote {
        #[arg(long)]
        entity_type: String,
        #[arg(long)]
        bundle: String,
        #[arg(long)]
        id: String,
        #[arg(long, default_value = REGISTRATION_TRIGGER)]
        trigger: String,
    },
    /// Remove all rules, components and schedules of a deleted event
    Purge {
        /// Event (entity_type:id)
        event: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List rule templates
    List,
    /// Create or replace templates from a YAML file (one document or a list)
    Import { file: PathBuf },
    /// Delete a template by id (entity_type.bundle.trigger.machine_name)
    Delete { id: String },
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(Box<T>),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![*item],
            Self::Many(items) => items,
        }
    }
}

async fn read_yaml<T: serde::de::DeserializeOwned>(file: &PathBuf) -> Result<Vec<T>> {
    let contents = fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let parsed: OneOrMany<T> =
        serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {}", file.display()))?;
    Ok(parsed.into_vec())
}

#[derive(Debug, serde::Serialize)]
pub struct EventTypeListOutput {
    pub event_types: Vec<EventType>,
    pub total: usize,
}

impl CommandOutput for EventTypeListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "identity types", "manage operation", "custom rules"]);
        for event_type in &self.event_types {
            table.add_row(vec![
                event_type.id(),
                event_type.identity_types.len().to_string(),
                event_type.event_manage_operation.clone(),
                if event_type.custom_rules { "yes" } else { "no" }.to_string(),
            ]);
        }
        render_list("event type", &table, self.total)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct EventTypeDetailOutput {
    #[serde(flatten)]
    pub event_type: EventType,
    pub templates: Vec<String>,
}

impl CommandOutput for EventTypeDetailOutput {
    fn to_human(&self) -> String {
        let event_type = &self.event_type;
        let registrant = event_type
            .default_registrant_type
            .as_ref()
            .map(|r| format!("{}.{}", r.entity_type, r.bundle));

        let mut view = DetailView::new(&format!("Event type {}", event_type.id()))
            .field("Manage operation", &event_type.event_manage_operation)
            .field("Custom rules", if event_type.custom_rules { "allowed" } else { "not allowed" })
            .field_opt("Default registrant", registrant.as_deref())
            .section("Identity types");
        for settings in &event_type.identity_types {
            view = view.item(&format!(
                "{}.{} (create: {}, reference: {})",
                settings.entity_type, settings.bundle, settings.create, settings.reference
            ));
        }
        view = view.section("Rule templates");
        for template in &self.templates {
            view = view.item(template);
        }
        view.render()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct TemplateListOutput {
    pub templates: Vec<RuleTemplate>,
    pub total: usize,
}

impl CommandOutput for TemplateListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "conditions", "actions"]);
        for template in &self.templates {
            table.add_row(vec![
                template.id(),
                template.conditions.keys().cloned().collect::<Vec<_>>().join(", "),
                template.actions.keys().cloned().collect::<Vec<_>>().join(", "),
            ]);
        }
        render_list("template", &table, self.total)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PromoteOutput {
    pub event: String,
    pub trigger: String,
    pub promoted: Vec<RuleOutput>,
}

impl CommandOutput for PromoteOutput {
    fn to_human(&self) -> String {
        if self.promoted.is_empty() {
            return format!("{} already has its own '{}' rules", self.event, self.trigger);
        }
        let mut lines = vec![format!(
            "Saved {} default rule(s) for {} ({})",
            self.promoted.len(),
            self.event,
            self.trigger
        )];
        for rule in &self.promoted {
            lines.push(format!("  - {}", rule.id.as_deref().unwrap_or("-")));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: EventTypeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = open_engine(config).await?;
    let registry = engine.registry();

    match args.command {
        EventTypeCommands::List => {
            let event_types = registry.list_event_types().await?;
            output(
                &EventTypeListOutput {
                    total: event_types.len(),
                    event_types,
                },
                json_mode,
            );
        }

        EventTypeCommands::Show { entity_type, bundle } => {
            let event_type = registry
                .get_event_type(&entity_type, &bundle)
                .await?
                .with_context(|| format!("Event type not found: {entity_type}.{bundle}"))?;
            let templates = registry
                .list_templates()
                .await?
                .into_iter()
                .filter(|t| t.entity_type == entity_type && t.bundle == bundle)
                .map(|t| t.id())
                .collect();
            output(&EventTypeDetailOutput { event_type, templates }, json_mode);
        }

        EventTypeCommands::Import { file } => {
            let event_types: Vec<EventType> = read_yaml(&file).await?;
            let count = event_types.len();
            for event_type in event_types {
                registry.save_event_type(event_type).await?;
            }
            output(&ActionOutput::ok(format!("Imported {count} event type(s)")), json_mode);
        }

        EventTypeCommands::Delete { entity_type, bundle } => {
            registry.delete_event_type(&entity_type, &bundle).await?;
            output(
                &ActionOutput::ok(format!("Event type {entity_type}.{bundle} deleted")),
                json_mode,
            );
        }

        EventTypeCommands::Template { command } => match command {
            TemplateCommands::List => {
                let templates = registry.list_templates().await?;
                output(
                    &TemplateListOutput {
                        total: templates.len(),
                        templates,
                    },
                    json_mode,
                );
            }
            TemplateCommands::Import { file } => {
                let templates: Vec<RuleTemplate> = read_yaml(&file).await?;
                let count = templates.len();
                for template in templates {
                    registry.save_template(template).await?;
                }
                output(&ActionOutput::ok(format!("Imported {count} template(s)")), json_mode);
            }
            TemplateCommands::Delete { id } => {
                registry.delete_template(&id).await?;
                output(&ActionOutput::ok(format!("Template {id} deleted")), json_mode);
            }
        },

        EventTypeCommands::Promote {
            entity_type,
            bundle,
            id,
            trigger,
        } => {
            let entity = EventEntity::new(entity_type, bundle, id);
            let facade = registry.get_facade(&entity).await?;
            let promoted = facade.promote_defaults_to_custom(&trigger).await?;
            output(
                &PromoteOutput {
                    event: entity.reference().to_string(),
                    trigger,
                    promoted: promoted.iter().map(RuleOutput::from).collect(),
                },
                json_mode,
            );
        }

        EventTypeCommands::Purge { event } => {
            let event = EventRef::parse(&event).with_context(|| format!("Expected entity_type:id, got '{event}'"))?;
            let deleted = registry.delete_event_data(&event).await?;
            output(
                &ActionOutput::ok(format!("Removed {deleted} rule(s) of {event}")),
                json_mode,
            );
        }
    }

    Ok(())
}
