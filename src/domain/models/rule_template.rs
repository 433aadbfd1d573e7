//! Site-wide default rule blueprints.
//!
//! When an event has no rules of its own for the registration trigger, the
//! templates for its `(entity_type, bundle, trigger)` are cloned into transient
//! rules.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::component::ComponentRecord;
use super::event::EventRef;
use super::rule::Rule;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTemplate {
    pub entity_type: String,
    pub bundle: String,
    pub trigger: String,
    /// Unique within `(entity_type, bundle, trigger)`.
    pub machine_name: String,
    /// Plugin id to configuration, in evaluation order.
    #[serde(default)]
    pub conditions: IndexMap<String, Value>,
    #[serde(default)]
    pub actions: IndexMap<String, Value>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl RuleTemplate {
    pub fn new(
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        trigger: impl Into<String>,
        machine_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            trigger: trigger.into(),
            machine_name: machine_name.into(),
            conditions: IndexMap::new(),
            actions: IndexMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_condition(mut self, plugin_id: impl Into<String>, configuration: Value) -> Self {
        self.conditions.insert(plugin_id.into(), configuration);
        self
    }

    pub fn with_action(mut self, plugin_id: impl Into<String>, configuration: Value) -> Self {
        self.actions.insert(plugin_id.into(), configuration);
        self
    }

    /// Storage id: `entity_type.bundle.trigger.machine_name`.
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.entity_type, self.bundle, self.trigger, self.machine_name
        )
    }

    /// Build an unsaved, active rule for `event` mirroring this template.
    pub fn to_rule(&self, event: EventRef) -> Rule {
        let mut rule = Rule::new(event, self.trigger.clone());
        for (plugin_id, configuration) in &self.conditions {
            rule.add_component(ComponentRecord::condition(plugin_id.clone(), configuration.clone()));
        }
        for (plugin_id, configuration) in &self.actions {
            rule.add_component(ComponentRecord::action(plugin_id.clone(), configuration.clone()));
        }
        rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_rule_mirrors_template() {
        let template = RuleTemplate::new("node", "conference", "registration", "user_role")
            .with_condition("user_role", json!({"roles": ["attendee"]}))
            .with_condition("current_time", json!({"date": "2000-01-01T00:00:00Z"}))
            .with_action("registration_operations", json!({"operations": {"create": true}}));

        let rule = template.to_rule(EventRef::new("node", "9"));
        assert!(rule.is_new());
        assert!(rule.active);
        assert_eq!(rule.trigger, "registration");

        let conditions: Vec<_> = rule.conditions().map(|c| c.plugin_id.as_str()).collect();
        assert_eq!(conditions, vec!["user_role", "current_time"]);
        let action = rule.actions().next().unwrap();
        assert_eq!(action.configuration, json!({"operations": {"create": true}}));
        assert!(rule.components().all(ComponentRecord::is_new));
    }

    #[test]
    fn test_template_id() {
        let template = RuleTemplate::new("node", "conference", "registration", "default");
        assert_eq!(template.id(), "node.conference.registration.default");
    }
}
