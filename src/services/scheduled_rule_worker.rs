//! Consumer for [`ScheduledRulePayload`]s.
//!
//! Each delivery counts as one attempt. The worker resolves the schedule's
//! rule and event, evaluates the rule and runs its actions. A completed run
//! deletes the schedule; a failed one clears `in_queue` so the next tick
//! queues it again until the attempt cap is passed.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Schedule, ScheduledRulePayload};
use crate::domain::ports::plugin::{ContextValues, CONTEXT_EVENT};
use crate::domain::ports::{EventLoader, ScheduleRepository};
use crate::services::plugin_registry::PluginRegistry;
use crate::services::rule_service::RuleService;

/// Context key carrying the schedule id during a scheduled run.
pub const CONTEXT_SCHEDULE_ID: &str = "schedule_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOutcome {
    /// Conditions passed and every action ran.
    Completed,
    /// Conditions did not pass; nothing ran.
    ConditionsFailed,
    /// The schedule no longer exists.
    ScheduleMissing,
    /// The schedule's component or rule is gone; the schedule was removed.
    Orphaned,
    /// The attempt cap is exceeded; left for garbage collection.
    Abandoned,
    /// The run failed and the schedule was released for another attempt.
    Retry,
}

pub struct ScheduledRuleWorker {
    schedules: Arc<dyn ScheduleRepository>,
    rules: Arc<RuleService>,
    events: Arc<dyn EventLoader>,
    plugins: Arc<PluginRegistry>,
}

impl ScheduledRuleWorker {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        rules: Arc<RuleService>,
        events: Arc<dyn EventLoader>,
        plugins: Arc<PluginRegistry>,
    ) -> Self {
        Self {
            schedules,
            rules,
            events,
            plugins,
        }
    }

    pub async fn process(&self, payload: &ScheduledRulePayload) -> DomainResult<WorkOutcome> {
        let Some(mut schedule) = self.schedules.get(payload.schedule_id).await? else {
            tracing::debug!(schedule_id = %payload.schedule_id, "Schedule already gone");
            return Ok(WorkOutcome::ScheduleMissing);
        };

        schedule.attempts += 1;
        schedule.updated_at = Utc::now();
        self.schedules.update(&schedule).await?;

        if schedule.is_expired() {
            tracing::debug!(
                schedule_id = %schedule.id,
                attempts = schedule.attempts,
                "Schedule exceeded attempts"
            );
            return Ok(WorkOutcome::Abandoned);
        }

        match self.run(&schedule).await {
            Ok(Some(passed)) => {
                self.schedules.delete(schedule.id).await?;
                if passed {
                    tracing::info!(schedule_id = %schedule.id, "Scheduled rule completed");
                    Ok(WorkOutcome::Completed)
                } else {
                    Ok(WorkOutcome::ConditionsFailed)
                }
            }
            Ok(None) => {
                self.schedules.delete(schedule.id).await?;
                tracing::warn!(schedule_id = %schedule.id, "Removed schedule without rule");
                Ok(WorkOutcome::Orphaned)
            }
            Err(e) => {
                tracing::warn!(
                    schedule_id = %schedule.id,
                    attempts = schedule.attempts,
                    error = %e,
                    "Scheduled rule failed"
                );
                self.schedules.release(schedule.id).await?;
                Ok(WorkOutcome::Retry)
            }
        }
    }

    /// `None` when the rule is gone, otherwise whether its conditions passed.
    async fn run(&self, schedule: &Schedule) -> DomainResult<Option<bool>> {
        let Some((rule, _)) = self.rules.rule_for_component(schedule.component_id).await? else {
            return Ok(None);
        };

        let event = self
            .events
            .load(&rule.event)
            .await?
            .ok_or_else(|| DomainError::EventNotFound(rule.event.clone()))?;

        let mut context = ContextValues::new();
        context.insert(CONTEXT_EVENT.to_string(), serde_json::to_value(&event)?);
        context.insert(CONTEXT_SCHEDULE_ID.to_string(), Value::String(schedule.id.to_string()));

        if !rule.evaluate_conditions(&self.plugins, &context) {
            return Ok(Some(false));
        }
        for action in rule.actions() {
            action.execute(&self.plugins, &context).await?;
        }
        Ok(Some(true))
    }
}
