//! Port for the queue that receives due schedules.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ScheduledRulePayload;

#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Hand a payload to the named queue. No retry happens here.
    async fn enqueue(&self, queue_name: &str, payload: &ScheduledRulePayload) -> DomainResult<()>;
}
