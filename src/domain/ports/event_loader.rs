//! Port through which the host resolves event references.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EventEntity, EventRef};

#[async_trait]
pub trait EventLoader: Send + Sync {
    async fn load(&self, event: &EventRef) -> DomainResult<Option<EventEntity>>;
}
