//! Domain errors for the event rules engine.

use thiserror::Error;
use uuid::Uuid;

use super::models::component::ComponentType;
use super::models::event::EventRef;

/// Domain-level errors that can occur while managing or evaluating rules.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not an event: {entity_type} bundle {bundle} has no event type configuration")]
    NotAnEvent { entity_type: String, bundle: String },

    #[error("Invalid component type: {0} (must be 'condition' or 'action')")]
    InvalidComponentType(String),

    #[error("Component type mismatch: expected {expected}, found {found}")]
    ComponentTypeMismatch {
        expected: ComponentType,
        found: ComponentType,
    },

    #[error("Unknown {component_type} plugin: {plugin_id}")]
    UnknownPlugin {
        component_type: ComponentType,
        plugin_id: String,
    },

    #[error("Invalid configuration for plugin {plugin_id}: {reason}")]
    InvalidConfiguration { plugin_id: String, reason: String },

    #[error("Rule not found: {0}")]
    RuleNotFound(Uuid),

    #[error("Component not found: {0}")]
    ComponentNotFound(Uuid),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(Uuid),

    #[error("Event not found: {0}")]
    EventNotFound(EventRef),

    #[error("Action {plugin_id} failed: {reason}")]
    ActionFailed { plugin_id: String, reason: String },

    #[error("Queue error: {0}")]
    QueueError(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
