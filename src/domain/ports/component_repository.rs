//! Repository port for rule components.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::ComponentRecord;

#[async_trait]
pub trait ComponentRepository: Send + Sync {
    /// Insert a component with `id` and `rule_id` assigned. It is appended
    /// after the rule's existing components.
    async fn create(&self, component: &ComponentRecord) -> DomainResult<()>;

    async fn get(&self, id: Uuid) -> DomainResult<Option<ComponentRecord>>;

    /// Update plugin id and configuration. The component type never changes.
    async fn update(&self, component: &ComponentRecord) -> DomainResult<()>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// Components of a rule in storage order.
    async fn list_for_rule(&self, rule_id: Uuid) -> DomainResult<Vec<ComponentRecord>>;
}
