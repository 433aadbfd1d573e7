//! Contracts for pluggable conditions and actions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::DomainResult;

/// Free-form context bag passed to conditions and actions.
///
/// When a trigger fires it always carries the event under [`CONTEXT_EVENT`].
pub type ContextValues = BTreeMap<String, Value>;

/// Context key under which the firing event is stored.
pub const CONTEXT_EVENT: &str = "event";

/// Describes one named context slot a condition can receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDefinition {
    pub data_type: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

impl ContextDefinition {
    pub fn new(data_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            label: label.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A boolean check guarding a rule.
///
/// Instances are created per evaluation from the component's configuration,
/// so they may hold the context values they were given.
pub trait ConditionPlugin: Send + Sync {
    /// Named context slots this condition reads.
    fn context_definitions(&self) -> BTreeMap<String, ContextDefinition> {
        BTreeMap::new()
    }

    fn set_context_value(&mut self, name: &str, value: Value);

    fn evaluate(&self) -> bool;

    /// Human-readable description of the configured check.
    fn summary(&self) -> String;
}

/// Work executed when a rule's conditions pass.
#[async_trait]
pub trait ActionPlugin: Send + Sync {
    async fn execute(&self, context: &ContextValues) -> DomainResult<()>;
}
