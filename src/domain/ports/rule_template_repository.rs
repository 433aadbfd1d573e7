//! Repository port for default rule templates.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::RuleTemplate;

#[async_trait]
pub trait RuleTemplateRepository: Send + Sync {
    async fn get(&self, id: &str) -> DomainResult<Option<RuleTemplate>>;

    /// Insert or replace the template with the same id.
    async fn save(&self, template: &RuleTemplate) -> DomainResult<()>;

    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// Templates for an entity type and bundle, optionally narrowed to one trigger.
    async fn list_matching(
        &self,
        entity_type: &str,
        bundle: &str,
        trigger: Option<&str>,
    ) -> DomainResult<Vec<RuleTemplate>>;

    /// Remove every template of an event type. Returns the number removed.
    async fn delete_for_event_type(&self, entity_type: &str, bundle: &str) -> DomainResult<u64>;

    async fn list(&self) -> DomainResult<Vec<RuleTemplate>>;
}
