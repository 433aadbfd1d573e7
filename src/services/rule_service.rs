//! Service for persisting rules and their components.
//!
//! Coordinates the rule, component and schedule repositories: saving a rule
//! flushes its pending components, deleting cascades to components and
//! schedules, and every save keeps scheduler-condition schedules in step with
//! the rule's active flag.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::adapters::plugins::RuleSchedulerCondition;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ComponentRecord, EventRef, Rule, Schedule};
use crate::domain::ports::{ComponentRepository, RuleFilter, RuleRepository, ScheduleRepository};

pub struct RuleService {
    rules: Arc<dyn RuleRepository>,
    components: Arc<dyn ComponentRepository>,
    schedules: Arc<dyn ScheduleRepository>,
}

impl RuleService {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        components: Arc<dyn ComponentRepository>,
        schedules: Arc<dyn ScheduleRepository>,
    ) -> Self {
        Self {
            rules,
            components,
            schedules,
        }
    }

    /// Create or update a rule, then persist each pending component in order.
    ///
    /// A new rule gets its id here; pending components receive their own ids
    /// and the rule id before being written. Scheduler conditions are synced
    /// afterwards, so toggling `active` creates or removes their schedules.
    pub async fn save_rule(&self, rule: &mut Rule) -> DomainResult<()> {
        let rule_id = if let Some(id) = rule.id {
            rule.updated_at = Utc::now();
            self.rules.update(rule).await?;
            id
        } else {
            let id = Uuid::new_v4();
            rule.id = Some(id);
            self.rules.create(rule).await?;
            tracing::info!(
                rule_id = %id,
                event = %rule.event,
                trigger = %rule.trigger,
                "Created rule"
            );
            id
        };

        let pending = rule.take_pending();
        if !pending.is_empty() {
            let mut stored: Vec<ComponentRecord> = rule.components().cloned().collect();
            for mut component in pending {
                let now = Utc::now();
                component.id = Some(Uuid::new_v4());
                component.rule_id = Some(rule_id);
                component.created_at = now;
                component.updated_at = now;
                self.components.create(&component).await?;
                stored.push(component);
            }
            rule.set_components(stored);
        }

        for component in rule.scheduler_conditions() {
            self.update_schedule_entity(rule, component).await?;
        }

        Ok(())
    }

    /// Create or update a single component of an existing rule.
    pub async fn save_component(&self, component: &mut ComponentRecord) -> DomainResult<()> {
        let rule_id = component.rule_id.ok_or_else(|| {
            DomainError::ValidationFailed("component must belong to a saved rule".to_string())
        })?;
        let rule = self
            .rules
            .get(rule_id)
            .await?
            .ok_or(DomainError::RuleNotFound(rule_id))?;

        let now = Utc::now();
        component.updated_at = now;
        if component.id.is_some() {
            self.components.update(component).await?;
        } else {
            component.id = Some(Uuid::new_v4());
            component.created_at = now;
            self.components.create(component).await?;
        }

        if component.is_scheduler() {
            self.update_schedule_entity(&rule, component).await?;
        }
        Ok(())
    }

    /// Mirror a scheduler condition into its schedule.
    ///
    /// While the rule is active the schedule exists and carries the configured
    /// date. Once inactive, or without a usable date, the schedule is removed
    /// unless it is queued: work in flight keeps its schedule until the
    /// consumer is done with it.
    pub async fn update_schedule_entity(
        &self,
        rule: &Rule,
        component: &ComponentRecord,
    ) -> DomainResult<()> {
        let Some(component_id) = component.id else {
            return Ok(());
        };
        let existing = self.schedules.get_by_component(component_id).await?;

        let date = if rule.active {
            match RuleSchedulerCondition::configured_date(&component.configuration) {
                Ok(date) => Some(date),
                Err(e) => {
                    tracing::warn!(
                        component_id = %component_id,
                        error = %e,
                        "Scheduler condition has no usable date"
                    );
                    None
                }
            }
        } else {
            None
        };

        if let Some(date) = date {
            match existing {
                Some(mut schedule) => {
                    if schedule.trigger_date.timestamp_millis() != date.timestamp_millis() {
                        schedule.trigger_date = date;
                        schedule.updated_at = Utc::now();
                        self.schedules.update(&schedule).await?;
                    }
                }
                None => {
                    let schedule = Schedule::new(component_id, date);
                    self.schedules.create(&schedule).await?;
                    tracing::debug!(
                        schedule_id = %schedule.id,
                        component_id = %component_id,
                        trigger_date = %date,
                        "Created schedule"
                    );
                }
            }
        } else if let Some(schedule) = existing {
            if !schedule.in_queue {
                self.schedules.delete(schedule.id).await?;
                tracing::debug!(
                    schedule_id = %schedule.id,
                    active = rule.active,
                    "Removed schedule"
                );
            }
        }

        Ok(())
    }

    pub async fn set_active(&self, rule_id: Uuid, active: bool) -> DomainResult<Rule> {
        let mut rule = self
            .get_rule(rule_id)
            .await?
            .ok_or(DomainError::RuleNotFound(rule_id))?;
        rule.active = active;
        self.save_rule(&mut rule).await?;
        Ok(rule)
    }

    /// Get a rule with its components attached.
    pub async fn get_rule(&self, rule_id: Uuid) -> DomainResult<Option<Rule>> {
        match self.rules.get(rule_id).await? {
            Some(rule) => Ok(Some(self.hydrate(rule).await?)),
            None => Ok(None),
        }
    }

    /// Rules matching the filter, with components attached.
    pub async fn find_rules(&self, filter: &RuleFilter) -> DomainResult<Vec<Rule>> {
        let rules = self.rules.find(filter).await?;
        let mut hydrated = Vec::with_capacity(rules.len());
        for rule in rules {
            hydrated.push(self.hydrate(rule).await?);
        }
        Ok(hydrated)
    }

    pub async fn count_rules(&self, filter: &RuleFilter) -> DomainResult<u64> {
        self.rules.count(filter).await
    }

    pub async fn get_component(&self, component_id: Uuid) -> DomainResult<Option<ComponentRecord>> {
        self.components.get(component_id).await
    }

    /// The rule owning a component, alongside the component itself.
    pub async fn rule_for_component(
        &self,
        component_id: Uuid,
    ) -> DomainResult<Option<(Rule, ComponentRecord)>> {
        let Some(component) = self.components.get(component_id).await? else {
            return Ok(None);
        };
        let Some(rule_id) = component.rule_id else {
            return Ok(None);
        };
        Ok(self.get_rule(rule_id).await?.map(|rule| (rule, component)))
    }

    /// Delete a component and the schedule it owns.
    pub async fn delete_component(&self, component_id: Uuid) -> DomainResult<()> {
        if self.components.get(component_id).await?.is_none() {
            return Err(DomainError::ComponentNotFound(component_id));
        }
        self.delete_component_schedule(component_id).await?;
        self.components.delete(component_id).await
    }

    /// Delete a rule, its components and their schedules.
    pub async fn delete_rule(&self, rule_id: Uuid) -> DomainResult<()> {
        if self.rules.get(rule_id).await?.is_none() {
            return Err(DomainError::RuleNotFound(rule_id));
        }

        for component in self.components.list_for_rule(rule_id).await? {
            if let Some(component_id) = component.id {
                self.delete_component_schedule(component_id).await?;
                self.components.delete(component_id).await?;
            }
        }
        self.rules.delete(rule_id).await?;
        tracing::info!(rule_id = %rule_id, "Deleted rule");
        Ok(())
    }

    /// Delete every rule of an event. Returns the number removed.
    pub async fn delete_rules_for_event(&self, event: &EventRef) -> DomainResult<u64> {
        let rules = self.rules.find(&RuleFilter::for_event(event.clone())).await?;
        let mut deleted = 0;
        for rule in rules {
            if let Some(rule_id) = rule.id {
                self.delete_rule(rule_id).await?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn delete_component_schedule(&self, component_id: Uuid) -> DomainResult<()> {
        if let Some(schedule) = self.schedules.get_by_component(component_id).await? {
            self.schedules.delete(schedule.id).await?;
        }
        Ok(())
    }

    async fn hydrate(&self, mut rule: Rule) -> DomainResult<Rule> {
        if let Some(rule_id) = rule.id {
            rule.set_components(self.components.list_for_rule(rule_id).await?);
        }
        Ok(rule)
    }
}
