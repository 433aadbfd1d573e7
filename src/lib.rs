//! Event Rules - rule engine for event automation
//!
//! Events are host objects that carry rules. A rule belongs to one event and
//! one trigger name and holds an ordered list of condition and action
//! components. When the trigger fires, the rule's conditions are evaluated in
//! order and, if they all pass, its actions run. Conditions that fire at a
//! future moment are persisted as schedules and handed to a work queue by a
//! periodic tick.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the storage/plugin ports
//! - **Service Layer** (`services`): rule persistence, event facades, scheduler tick
//! - **Adapters** (`adapters`): SQLite repositories and built-in plugins
//! - **Application Layer** (`application`): wiring into a [`RuleEngine`]
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use event_rules::{ConfigLoader, PluginRegistry, RuleEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let engine = RuleEngine::open(&config, PluginRegistry::with_builtins()).await?;
//!     engine.scheduler().tick(chrono::Utc::now()).await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::RuleEngine;
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    ComponentRecord, ComponentType, Config, EventEntity, EventRef, EventType, Rule, RuleTemplate,
    Schedule, ScheduledRulePayload, ATTEMPTS_MAX, REGISTRATION_TRIGGER,
};
pub use domain::ports::{
    ActionPlugin, ComponentRepository, ConditionPlugin, ContextValues, EventLoader,
    EventTypeRepository, RuleFilter, RuleRepository, RuleTemplateRepository, ScheduleRepository,
    WorkQueue,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    EventFacade, EventRegistry, PluginRegistry, RuleScheduler, RuleService, ScheduledRuleWorker,
    TickReport, WorkOutcome,
};
