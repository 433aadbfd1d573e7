//! Per-event query surface.
//!
//! An [`EventFacade`] wraps one event together with its [`EventType`]. It
//! answers which rules apply for a trigger (falling back to the site-wide
//! templates for registration), fires triggers, and exposes the identity and
//! capacity facts derived from the event type and the event's attributes.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::errors::DomainResult;
use crate::domain::models::event::{ATTRIBUTE_CAPACITY, ATTRIBUTE_REGISTRATION_OPEN};
use crate::domain::models::{
    EventEntity, EventRef, EventType, IdentityTypeRef, IdentityTypeSettings, Rule,
    REGISTRATION_TRIGGER,
};
use crate::domain::ports::plugin::{ContextValues, CONTEXT_EVENT};
use crate::domain::ports::{RuleFilter, RuleTemplateRepository};
use crate::services::plugin_registry::PluginRegistry;
use crate::services::rule_service::RuleService;

pub struct EventFacade {
    event: EventEntity,
    event_type: EventType,
    rules: Arc<RuleService>,
    templates: Arc<dyn RuleTemplateRepository>,
    plugins: Arc<PluginRegistry>,
}

impl EventFacade {
    pub fn new(
        event: EventEntity,
        event_type: EventType,
        rules: Arc<RuleService>,
        templates: Arc<dyn RuleTemplateRepository>,
        plugins: Arc<PluginRegistry>,
    ) -> Self {
        Self {
            event,
            event_type,
            rules,
            templates,
            plugins,
        }
    }

    pub fn event(&self) -> &EventEntity {
        &self.event
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn reference(&self) -> EventRef {
        self.event.reference()
    }

    /// Rules for this event.
    ///
    /// Stored rules are returned when any match. When none do, `use_defaults`
    /// is set and the trigger is the registration trigger, transient rules are
    /// built from the matching templates instead. They have no ids and are not
    /// persisted.
    pub async fn get_rules(
        &self,
        trigger: Option<&str>,
        use_defaults: bool,
        active_only: bool,
    ) -> DomainResult<Vec<Rule>> {
        let mut filter = RuleFilter::for_event(self.reference());
        if let Some(trigger) = trigger {
            filter = filter.with_trigger(trigger);
        }
        if active_only {
            filter = filter.with_active(true);
        }

        let rules = self.rules.find_rules(&filter).await?;
        if !rules.is_empty() || !use_defaults || trigger != Some(REGISTRATION_TRIGGER) {
            return Ok(rules);
        }

        let templates = self
            .templates
            .list_matching(&self.event.entity_type, &self.event.bundle, trigger)
            .await?;
        tracing::debug!(
            event = %self.reference(),
            templates = templates.len(),
            "Using default rules"
        );
        Ok(templates
            .iter()
            .map(|template| template.to_rule(self.reference()))
            .collect())
    }

    /// Whether the event has no active rules of its own for `trigger`.
    pub async fn is_using_defaults(&self, trigger: &str) -> DomainResult<bool> {
        Ok(self.get_rules(Some(trigger), false, true).await?.is_empty())
    }

    /// Fire a trigger against this event's active stored rules.
    ///
    /// The event is added to the context under `event`. Every rule whose
    /// conditions pass runs its actions in order. An action error is logged
    /// and does not stop the remaining actions. Returns how many rules passed.
    pub async fn trigger(&self, name: &str, mut context: ContextValues) -> DomainResult<usize> {
        context.insert(CONTEXT_EVENT.to_string(), serde_json::to_value(&self.event)?);

        let rules = self.get_rules(Some(name), false, true).await?;
        let mut passed = 0;
        for rule in &rules {
            if !rule.evaluate_conditions(&self.plugins, &context) {
                continue;
            }
            passed += 1;

            for action in rule.actions() {
                if let Err(e) = action.execute(&self.plugins, &context).await {
                    tracing::warn!(
                        rule_id = ?rule.id,
                        plugin_id = %action.plugin_id,
                        error = %e,
                        "Action failed"
                    );
                }
            }
        }

        tracing::info!(
            event = %self.reference(),
            trigger = %name,
            rules = rules.len(),
            passed,
            "Trigger fired"
        );
        Ok(passed)
    }

    /// Persist the default rules for `trigger` as this event's own rules.
    ///
    /// Defaults are only synthesized while the event has no active rules for
    /// `trigger`. Inactive stored rules do not count, so callers check
    /// [`is_using_defaults`](Self::is_using_defaults) or their own rules
    /// before promoting again.
    pub async fn promote_defaults_to_custom(&self, trigger: &str) -> DomainResult<Vec<Rule>> {
        let mut promoted = Vec::new();
        for mut rule in self.get_rules(Some(trigger), true, true).await? {
            if rule.is_new() {
                self.rules.save_rule(&mut rule).await?;
                promoted.push(rule);
            }
        }
        if !promoted.is_empty() {
            tracing::info!(
                event = %self.reference(),
                trigger = %trigger,
                count = promoted.len(),
                "Promoted default rules"
            );
        }
        Ok(promoted)
    }

    pub fn identity_types(&self) -> &[IdentityTypeSettings] {
        &self.event_type.identity_types
    }

    pub fn can_create_identity(&self, entity_type: &str, bundle: &str) -> bool {
        self.event_type
            .identity_settings(entity_type, bundle)
            .is_some_and(|s| s.create)
    }

    pub fn can_reference_identity(&self, entity_type: &str, bundle: &str) -> bool {
        self.event_type
            .identity_settings(entity_type, bundle)
            .is_some_and(|s| s.reference)
    }

    pub fn default_registrant_type(&self) -> Option<&IdentityTypeRef> {
        self.event_type.default_registrant_type.as_ref()
    }

    pub fn manage_operation(&self) -> &str {
        &self.event_type.event_manage_operation
    }

    pub fn custom_rules_allowed(&self) -> bool {
        self.event_type.custom_rules
    }

    /// Registration capacity, `None` when unlimited.
    pub fn capacity(&self) -> Option<u64> {
        self.event
            .attributes
            .get(ATTRIBUTE_CAPACITY)
            .and_then(Value::as_i64)
            .and_then(|c| u64::try_from(c).ok())
    }

    /// Places left given the current number of registrations.
    pub fn remaining_capacity(&self, registered: u64) -> Option<u64> {
        self.capacity().map(|c| c.saturating_sub(registered))
    }

    /// Whether the event is open for registrations. Closed unless the
    /// `registration_open` attribute is `true`.
    pub fn is_accepting_registrations(&self) -> bool {
        self.event
            .attributes
            .get(ATTRIBUTE_REGISTRATION_OPEN)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
