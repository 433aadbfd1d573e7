//! Repository port for rules.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EventRef, Rule};

/// Equality filter over stored rules. `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub event: Option<EventRef>,
    pub trigger: Option<String>,
    pub active: Option<bool>,
}

impl RuleFilter {
    pub fn for_event(event: EventRef) -> Self {
        Self {
            event: Some(event),
            ..Default::default()
        }
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

/// Persists rule rows. Components live in their own repository.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Insert a rule that already has an id assigned.
    async fn create(&self, rule: &Rule) -> DomainResult<()>;

    /// Get a rule by ID, without components.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Rule>>;

    async fn update(&self, rule: &Rule) -> DomainResult<()>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// Rules matching the filter, oldest first.
    async fn find(&self, filter: &RuleFilter) -> DomainResult<Vec<Rule>>;

    /// Number of rules matching the filter.
    async fn count(&self, filter: &RuleFilter) -> DomainResult<u64>;
}
