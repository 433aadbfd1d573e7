//! Plugin registry for conditions and actions.
//!
//! The [`PluginRegistry`] is an explicit table of factories keyed by
//! `(component type, plugin id)`. It is built once at startup and shared by
//! every service that evaluates rules. A [`ComponentRecord`] resolves its
//! runtime behavior through [`PluginRegistry::instantiate`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::adapters::plugins::{
    current_time::CURRENT_TIME_PLUGIN_ID, CurrentTimeCondition, RuleSchedulerCondition,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ComponentRecord, ComponentType, RULE_SCHEDULER_PLUGIN_ID};
use crate::domain::ports::plugin::{ActionPlugin, ConditionPlugin};

/// Builds a condition instance from a component's configuration.
pub type ConditionFactory =
    Arc<dyn Fn(&Value) -> DomainResult<Box<dyn ConditionPlugin>> + Send + Sync>;

/// Builds an action instance from a component's configuration.
pub type ActionFactory = Arc<dyn Fn(&Value) -> DomainResult<Box<dyn ActionPlugin>> + Send + Sync>;

/// A freshly instantiated plugin.
pub enum ComponentInstance {
    Condition(Box<dyn ConditionPlugin>),
    Action(Box<dyn ActionPlugin>),
}

impl ComponentInstance {
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::Condition(_) => ComponentType::Condition,
            Self::Action(_) => ComponentType::Action,
        }
    }
}

/// Listing entry for a registered plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDefinition {
    pub id: String,
    pub label: String,
    pub component_type: ComponentType,
}

struct Registered<F> {
    label: String,
    factory: F,
}

/// Central registry of condition and action plugins.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    conditions: BTreeMap<String, Arc<Registered<ConditionFactory>>>,
    actions: BTreeMap<String, Arc<Registered<ActionFactory>>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("conditions", &self.conditions.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in time conditions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_condition(CURRENT_TIME_PLUGIN_ID, "Current time", |configuration| {
            let condition = CurrentTimeCondition::from_config(configuration)?;
            Ok(Box::new(condition) as Box<dyn ConditionPlugin>)
        });
        registry.register_condition(RULE_SCHEDULER_PLUGIN_ID, "Rule scheduler", |configuration| {
            let condition = RuleSchedulerCondition::from_config(configuration)?;
            Ok(Box::new(condition) as Box<dyn ConditionPlugin>)
        });
        registry
    }

    /// Register (or replace) a condition factory.
    pub fn register_condition<F>(
        &mut self,
        plugin_id: impl Into<String>,
        label: impl Into<String>,
        factory: F,
    ) where
        F: Fn(&Value) -> DomainResult<Box<dyn ConditionPlugin>> + Send + Sync + 'static,
    {
        let plugin_id = plugin_id.into();
        tracing::debug!(plugin_id = %plugin_id, "Registering condition plugin");
        self.conditions.insert(
            plugin_id,
            Arc::new(Registered {
                label: label.into(),
                factory: Arc::new(factory),
            }),
        );
    }

    /// Register (or replace) an action factory.
    pub fn register_action<F>(
        &mut self,
        plugin_id: impl Into<String>,
        label: impl Into<String>,
        factory: F,
    ) where
        F: Fn(&Value) -> DomainResult<Box<dyn ActionPlugin>> + Send + Sync + 'static,
    {
        let plugin_id = plugin_id.into();
        tracing::debug!(plugin_id = %plugin_id, "Registering action plugin");
        self.actions.insert(
            plugin_id,
            Arc::new(Registered {
                label: label.into(),
                factory: Arc::new(factory),
            }),
        );
    }

    /// Builder form of [`register_condition`](Self::register_condition).
    pub fn with_condition<F>(
        mut self,
        plugin_id: impl Into<String>,
        label: impl Into<String>,
        factory: F,
    ) -> Self
    where
        F: Fn(&Value) -> DomainResult<Box<dyn ConditionPlugin>> + Send + Sync + 'static,
    {
        self.register_condition(plugin_id, label, factory);
        self
    }

    /// Builder form of [`register_action`](Self::register_action).
    pub fn with_action<F>(
        mut self,
        plugin_id: impl Into<String>,
        label: impl Into<String>,
        factory: F,
    ) -> Self
    where
        F: Fn(&Value) -> DomainResult<Box<dyn ActionPlugin>> + Send + Sync + 'static,
    {
        self.register_action(plugin_id, label, factory);
        self
    }

    pub fn has_plugin(&self, component_type: ComponentType, plugin_id: &str) -> bool {
        match component_type {
            ComponentType::Condition => self.conditions.contains_key(plugin_id),
            ComponentType::Action => self.actions.contains_key(plugin_id),
        }
    }

    /// Resolve `(type, plugin_id)` and build an instance from the record's configuration.
    pub fn instantiate(&self, record: &ComponentRecord) -> DomainResult<ComponentInstance> {
        let unknown = || DomainError::UnknownPlugin {
            component_type: record.component_type(),
            plugin_id: record.plugin_id.clone(),
        };

        match record.component_type() {
            ComponentType::Condition => {
                let entry = self.conditions.get(&record.plugin_id).ok_or_else(unknown)?;
                (entry.factory)(&record.configuration).map(ComponentInstance::Condition)
            }
            ComponentType::Action => {
                let entry = self.actions.get(&record.plugin_id).ok_or_else(unknown)?;
                (entry.factory)(&record.configuration).map(ComponentInstance::Action)
            }
        }
    }

    /// All registered plugins, conditions first, each group sorted by id.
    pub fn definitions(&self) -> Vec<PluginDefinition> {
        let conditions = self.conditions.iter().map(|(id, entry)| PluginDefinition {
            id: id.clone(),
            label: entry.label.clone(),
            component_type: ComponentType::Condition,
        });
        let actions = self.actions.iter().map(|(id, entry)| PluginDefinition {
            id: id.clone(),
            label: entry.label.clone(),
            component_type: ComponentType::Action,
        });
        conditions.chain(actions).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::plugin::ContextValues;
    use async_trait::async_trait;
    use serde_json::json;

    struct NoopAction;

    #[async_trait]
    impl ActionPlugin for NoopAction {
        async fn execute(&self, _context: &ContextValues) -> DomainResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = PluginRegistry::with_builtins();
        let ids: Vec<_> = registry.definitions().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["current_time", "rule_scheduler"]);
        assert!(registry.has_plugin(ComponentType::Condition, "rule_scheduler"));
        assert!(!registry.has_plugin(ComponentType::Action, "rule_scheduler"));
    }

    #[test]
    fn test_lookup_is_keyed_by_type() {
        let registry = PluginRegistry::with_builtins()
            .with_action("noop", "No-op", |_| Ok(Box::new(NoopAction) as Box<dyn ActionPlugin>));

        let as_action =
            ComponentRecord::action("current_time", json!({"date": "2000-01-01T00:00:00Z"}));
        let err = registry.instantiate(&as_action).err().unwrap();
        assert!(matches!(
            err,
            DomainError::UnknownPlugin {
                component_type: ComponentType::Action,
                ref plugin_id,
            } if plugin_id == "current_time"
        ));

        let noop = ComponentRecord::action("noop", json!({}));
        let instance = registry.instantiate(&noop).ok().unwrap();
        assert_eq!(instance.component_type(), ComponentType::Action);
    }

    #[test]
    fn test_invalid_configuration_propagates() {
        let registry = PluginRegistry::with_builtins();
        let record = ComponentRecord::condition("rule_scheduler", json!({}));
        let err = registry.instantiate(&record).err().unwrap();
        assert!(matches!(err, DomainError::InvalidConfiguration { .. }));
    }
}
