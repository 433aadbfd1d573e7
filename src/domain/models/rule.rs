//! Rule domain model.
//!
//! A Rule belongs to exactly one event and one trigger. It owns an ordered set
//! of [`ComponentRecord`]s: conditions guard the rule, actions run when every
//! condition passes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::component::{ComponentRecord, ComponentType};
use super::event::EventRef;
use crate::domain::ports::plugin::ContextValues;
use crate::services::plugin_registry::PluginRegistry;

/// The only trigger that falls back to default rule templates.
pub const REGISTRATION_TRIGGER: &str = "registration";

/// An AND-combination of conditions guarding a list of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// `None` while the rule is transient (never saved).
    pub id: Option<Uuid>,
    pub event: EventRef,
    pub trigger: String,
    pub active: bool,
    /// Persisted components in storage order.
    components: Vec<ComponentRecord>,
    /// Components added since the last save; flushed when the rule is saved.
    #[serde(default)]
    pending: Vec<ComponentRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(event: EventRef, trigger: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            event,
            trigger: trigger.into(),
            active: true,
            components: Vec::new(),
            pending: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a rule loaded from storage. Components are attached separately.
    pub fn restore(
        id: Uuid,
        event: EventRef,
        trigger: String,
        active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            event,
            trigger,
            active,
            components: Vec::new(),
            pending: Vec::new(),
            created_at,
            updated_at,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_component(mut self, component: ComponentRecord) -> Self {
        self.add_component(component);
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Attach a component in memory. It is persisted when the rule is saved.
    pub fn add_component(&mut self, component: ComponentRecord) {
        self.pending.push(component);
    }

    /// Replace the persisted component list (storage hydration).
    pub fn set_components(&mut self, components: Vec<ComponentRecord>) {
        self.components = components;
    }

    /// Move the pending components out for flushing.
    pub fn take_pending(&mut self) -> Vec<ComponentRecord> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// All components: persisted first, then pending ones.
    pub fn components(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.components.iter().chain(self.pending.iter())
    }

    pub fn components_of(
        &self,
        component_type: ComponentType,
    ) -> impl Iterator<Item = &ComponentRecord> {
        self.components()
            .filter(move |c| c.component_type() == component_type)
    }

    pub fn conditions(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.components_of(ComponentType::Condition)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.components_of(ComponentType::Action)
    }

    /// Scheduler conditions, each of which owns at most one schedule.
    pub fn scheduler_conditions(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.components().filter(|c| c.is_scheduler())
    }

    /// Evaluate every condition in storage order.
    ///
    /// Returns `false` as soon as one condition evaluates false; the remaining
    /// conditions are not evaluated. Otherwise the result is `true` only when
    /// every condition both instantiated and evaluated true, so a rule with no
    /// conditions passes. A condition that cannot be instantiated is skipped
    /// and only fails the rule at the final comparison.
    pub fn evaluate_conditions(&self, plugins: &PluginRegistry, context: &ContextValues) -> bool {
        let mut total = 0usize;
        let mut instantiated = 0usize;
        let mut success = 0usize;

        for record in self.conditions() {
            total += 1;

            let mut condition = match record.instantiate_condition(plugins) {
                Ok(condition) => {
                    instantiated += 1;
                    condition
                }
                Err(e) => {
                    tracing::warn!(
                        rule_id = ?self.id,
                        plugin_id = %record.plugin_id,
                        error = %e,
                        "Condition failed to instantiate"
                    );
                    continue;
                }
            };

            for name in condition.context_definitions().into_keys() {
                if let Some(value) = context.get(&name) {
                    condition.set_context_value(&name, value.clone());
                }
            }

            if !condition.evaluate() {
                tracing::debug!(
                    rule_id = ?self.id,
                    plugin_id = %record.plugin_id,
                    "Condition evaluated false"
                );
                return false;
            }
            success += 1;
        }

        success == total && instantiated == total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event() -> EventRef {
        EventRef::new("node", "1")
    }

    #[test]
    fn test_new_rule_defaults() {
        let rule = Rule::new(event(), "registration");
        assert!(rule.is_new());
        assert!(rule.active);
        assert_eq!(rule.components().count(), 0);
    }

    #[test]
    fn test_conditions_and_actions_merge_pending() {
        let mut rule = Rule::restore(
            Uuid::new_v4(),
            event(),
            "registration".to_string(),
            true,
            Utc::now(),
            Utc::now(),
        );
        rule.set_components(vec![ComponentRecord::condition("a", json!({}))]);
        rule.add_component(ComponentRecord::condition("b", json!({})));
        rule.add_component(ComponentRecord::action("c", json!({})));

        let conditions: Vec<_> = rule.conditions().map(|c| c.plugin_id.as_str()).collect();
        assert_eq!(conditions, vec!["a", "b"]);
        let actions: Vec<_> = rule.actions().map(|c| c.plugin_id.as_str()).collect();
        assert_eq!(actions, vec!["c"]);

        let pending = rule.take_pending();
        assert_eq!(pending.len(), 2);
        assert!(!rule.has_pending());
        assert_eq!(rule.components().count(), 1);
    }

    #[test]
    fn test_zero_conditions_is_vacuously_true() {
        let plugins = PluginRegistry::new();
        let rule = Rule::new(event(), "registration")
            .with_component(ComponentRecord::action("anything", json!({})));
        assert!(rule.evaluate_conditions(&plugins, &ContextValues::new()));
    }

    #[test]
    fn test_unknown_plugin_fails_final_check() {
        let plugins = PluginRegistry::with_builtins();
        let rule = Rule::new(event(), "registration")
            .with_component(ComponentRecord::condition("missing_plugin", json!({})));
        assert!(!rule.evaluate_conditions(&plugins, &ContextValues::new()));
    }

    #[test]
    fn test_builtin_current_time_condition() {
        let plugins = PluginRegistry::with_builtins();
        let past = Rule::new(event(), "custom:date").with_component(ComponentRecord::condition(
            "current_time",
            json!({"date": "2000-01-01T00:00:00Z"}),
        ));
        assert!(past.evaluate_conditions(&plugins, &ContextValues::new()));

        let future = Rule::new(event(), "custom:date").with_component(ComponentRecord::condition(
            "current_time",
            json!({"date": "2999-01-01T00:00:00Z"}),
        ));
        assert!(!future.evaluate_conditions(&plugins, &ContextValues::new()));
    }
}
