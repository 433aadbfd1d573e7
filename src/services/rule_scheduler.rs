//! Periodic tick that hands due schedules to the work queue.
//!
//! Each tick enqueues every due schedule at most once and then garbage
//! collects schedules that ran out of attempts. A successful enqueue
//! deactivates the owning rule so it does not fire again from a trigger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Schedule, ScheduledRulePayload, ATTEMPTS_MAX};
use crate::domain::ports::{ScheduleRepository, WorkQueue};
use crate::services::rule_service::RuleService;

/// Default queue receiving [`ScheduledRulePayload`]s.
pub const DEFAULT_QUEUE_NAME: &str = "rule_scheduler";

/// Outcome counters of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Schedules handed to the queue.
    pub queued: usize,
    /// Due schedules another tick claimed first.
    pub skipped: usize,
    /// Enqueue attempts that failed; those schedules stay eligible.
    pub enqueue_failures: usize,
    /// Schedules removed for exceeding the attempt cap.
    pub expired: usize,
}

pub struct RuleScheduler {
    schedules: Arc<dyn ScheduleRepository>,
    rules: Arc<RuleService>,
    queue: Arc<dyn WorkQueue>,
    queue_name: String,
    running: Arc<AtomicBool>,
}

impl RuleScheduler {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        rules: Arc<RuleService>,
        queue: Arc<dyn WorkQueue>,
    ) -> Self {
        Self {
            schedules,
            rules,
            queue,
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Cron entry point: enqueue due schedules, then drop expired ones.
    pub async fn tick(&self, now: DateTime<Utc>) -> DomainResult<TickReport> {
        let mut report = self.schedule_rules(now).await?;
        report.expired = self.delete_expired_schedules().await?;
        tracing::debug!(
            queued = report.queued,
            skipped = report.skipped,
            enqueue_failures = report.enqueue_failures,
            expired = report.expired,
            "Scheduler tick complete"
        );
        Ok(report)
    }

    /// Enqueue every due schedule that is not already queued.
    ///
    /// The `in_queue` flag is claimed in storage before enqueueing, so a
    /// schedule is handed out once even when ticks overlap. A failed enqueue
    /// releases the claim and the schedule is retried on the next tick. A
    /// queued schedule whose rule cannot be deactivated fails the tick.
    pub async fn schedule_rules(&self, now: DateTime<Utc>) -> DomainResult<TickReport> {
        let mut report = TickReport::default();

        for schedule in self.schedules.list_due(now, ATTEMPTS_MAX).await? {
            if !self.schedules.claim(schedule.id).await? {
                report.skipped += 1;
                continue;
            }

            let payload = ScheduledRulePayload {
                schedule_id: schedule.id,
            };
            match self.queue.enqueue(&self.queue_name, &payload).await {
                Ok(()) => {
                    report.queued += 1;
                    tracing::info!(
                        schedule_id = %schedule.id,
                        queue = %self.queue_name,
                        "Queued scheduled rule"
                    );
                    self.deactivate_owner(&schedule).await?;
                }
                Err(e) => {
                    report.enqueue_failures += 1;
                    tracing::warn!(
                        schedule_id = %schedule.id,
                        error = %e,
                        "Failed to enqueue scheduled rule"
                    );
                    self.schedules.release(schedule.id).await?;
                }
            }
        }

        Ok(report)
    }

    /// Delete schedules whose attempts exceed the cap, whatever their state.
    pub async fn delete_expired_schedules(&self) -> DomainResult<usize> {
        let expired = self.schedules.list_expired(ATTEMPTS_MAX).await?;
        for schedule in &expired {
            self.schedules.delete(schedule.id).await?;
            tracing::debug!(
                schedule_id = %schedule.id,
                attempts = schedule.attempts,
                "Removed expired schedule"
            );
        }
        Ok(expired.len())
    }

    async fn deactivate_owner(&self, schedule: &Schedule) -> DomainResult<()> {
        match self.rules.rule_for_component(schedule.component_id).await? {
            Some((rule, _)) => {
                if let (Some(rule_id), true) = (rule.id, rule.active) {
                    self.rules.set_active(rule_id, false).await?;
                }
            }
            None => {
                tracing::debug!(schedule_id = %schedule.id, "Schedule has no owning rule");
            }
        }
        Ok(())
    }

    /// Run [`tick`](Self::tick) every `interval` until [`stop`](Self::stop).
    pub fn start(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        let scheduler = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            tracing::info!(interval_secs = interval.as_secs(), "Rule scheduler started");

            while scheduler.running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !scheduler.running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = scheduler.tick(Utc::now()).await {
                    tracing::error!(error = %e, "Scheduler tick failed");
                }
            }

            tracing::info!("Rule scheduler stopped");
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
