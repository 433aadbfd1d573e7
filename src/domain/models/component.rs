//! Condition and action records attached to a rule.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::schedule::RULE_SCHEDULER_PLUGIN_ID;
use crate::domain::ports::plugin::{ActionPlugin, ConditionPlugin, ContextValues};
use crate::services::plugin_registry::{ComponentInstance, PluginRegistry};

/// Kind of a rule component. Fixed once the record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Condition,
    Action,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Action => "action",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "condition" => Ok(Self::Condition),
            "action" => Ok(Self::Action),
            other => Err(DomainError::InvalidComponentType(other.to_string())),
        }
    }
}

/// A plugin id plus its opaque configuration, owned by one rule.
///
/// `id` and `rule_id` stay `None` until the owning rule is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: Option<Uuid>,
    pub rule_id: Option<Uuid>,
    component_type: ComponentType,
    pub plugin_id: String,
    pub configuration: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ComponentRecord {
    pub fn new(
        component_type: ComponentType,
        plugin_id: impl Into<String>,
        configuration: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            rule_id: None,
            component_type,
            plugin_id: plugin_id.into(),
            configuration,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn condition(plugin_id: impl Into<String>, configuration: Value) -> Self {
        Self::new(ComponentType::Condition, plugin_id, configuration)
    }

    pub fn action(plugin_id: impl Into<String>, configuration: Value) -> Self {
        Self::new(ComponentType::Action, plugin_id, configuration)
    }

    /// Rebuild a record loaded from storage.
    pub fn restore(
        id: Uuid,
        rule_id: Uuid,
        component_type: ComponentType,
        plugin_id: String,
        configuration: Value,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            rule_id: Some(rule_id),
            component_type,
            plugin_id,
            configuration,
            created_at,
            updated_at,
        }
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_condition(&self) -> bool {
        self.component_type == ComponentType::Condition
    }

    pub fn is_action(&self) -> bool {
        self.component_type == ComponentType::Action
    }

    /// Whether this record is the scheduling condition that owns a schedule.
    pub fn is_scheduler(&self) -> bool {
        self.is_condition() && self.plugin_id == RULE_SCHEDULER_PLUGIN_ID
    }

    /// Resolve the plugin for this record's `(type, plugin_id)`.
    pub fn instantiate(&self, plugins: &PluginRegistry) -> DomainResult<ComponentInstance> {
        plugins.instantiate(self)
    }

    pub fn instantiate_condition(
        &self,
        plugins: &PluginRegistry,
    ) -> DomainResult<Box<dyn ConditionPlugin>> {
        match self.instantiate(plugins)? {
            ComponentInstance::Condition(condition) => Ok(condition),
            ComponentInstance::Action(_) => Err(DomainError::ComponentTypeMismatch {
                expected: ComponentType::Condition,
                found: ComponentType::Action,
            }),
        }
    }

    pub fn instantiate_action(
        &self,
        plugins: &PluginRegistry,
    ) -> DomainResult<Box<dyn ActionPlugin>> {
        match self.instantiate(plugins)? {
            ComponentInstance::Action(action) => Ok(action),
            ComponentInstance::Condition(_) => Err(DomainError::ComponentTypeMismatch {
                expected: ComponentType::Action,
                found: ComponentType::Condition,
            }),
        }
    }

    /// Run the action with the given context bag. Only valid for actions.
    pub async fn execute(
        &self,
        plugins: &PluginRegistry,
        context: &ContextValues,
    ) -> DomainResult<()> {
        let action = self.instantiate_action(plugins)?;
        action.execute(context).await
    }
}
