//! Repository port for event type configuration.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::EventType;

#[async_trait]
pub trait EventTypeRepository: Send + Sync {
    async fn get(&self, entity_type: &str, bundle: &str) -> DomainResult<Option<EventType>>;

    /// Insert or replace the event type for its `(entity_type, bundle)`.
    async fn save(&self, event_type: &EventType) -> DomainResult<()>;

    async fn delete(&self, entity_type: &str, bundle: &str) -> DomainResult<()>;

    async fn list(&self) -> DomainResult<Vec<EventType>>;
}
