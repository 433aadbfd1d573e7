//! Repository port for schedules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Schedule;

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create(&self, schedule: &Schedule) -> DomainResult<()>;

    async fn get(&self, id: Uuid) -> DomainResult<Option<Schedule>>;

    /// The schedule owned by a scheduler condition, if any.
    async fn get_by_component(&self, component_id: Uuid) -> DomainResult<Option<Schedule>>;

    async fn update(&self, schedule: &Schedule) -> DomainResult<()>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    async fn list(&self) -> DomainResult<Vec<Schedule>>;

    /// Schedules with `trigger_date <= now`, not queued and `attempts <= attempts_max`.
    async fn list_due(&self, now: DateTime<Utc>, attempts_max: u32) -> DomainResult<Vec<Schedule>>;

    /// Schedules with `attempts > attempts_max`.
    async fn list_expired(&self, attempts_max: u32) -> DomainResult<Vec<Schedule>>;

    /// Atomically flip `in_queue` from false to true. Returns whether this
    /// caller won the claim.
    async fn claim(&self, id: Uuid) -> DomainResult<bool>;

    /// Clear `in_queue` so the schedule becomes eligible again.
    async fn release(&self, id: Uuid) -> DomainResult<()>;
}
