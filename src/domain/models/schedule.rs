//! Durable fire-time record for a scheduler condition.
//!
//! A Schedule mirrors the configured date of one `rule_scheduler` condition.
//! The scheduler tick enqueues it once due; the queue consumer increments
//! `attempts` before each try. Once `attempts` exceeds [`ATTEMPTS_MAX`] the
//! schedule is abandoned and deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Retry ceiling for a queued schedule.
pub const ATTEMPTS_MAX: u32 = 5;

/// Plugin id of the built-in scheduling condition.
pub const RULE_SCHEDULER_PLUGIN_ID: &str = "rule_scheduler";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    /// The scheduler condition this schedule belongs to. Unique.
    pub component_id: Uuid,
    pub trigger_date: DateTime<Utc>,
    /// Set while work for this schedule is outstanding in the queue.
    pub in_queue: bool,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(component_id: Uuid, trigger_date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            component_id,
            trigger_date,
            in_queue: false,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.trigger_date <= now && !self.in_queue && self.attempts <= ATTEMPTS_MAX
    }

    pub fn is_expired(&self) -> bool {
        self.attempts > ATTEMPTS_MAX
    }
}

/// Payload handed to the work queue for a due schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledRulePayload {
    pub schedule_id: Uuid,
}
