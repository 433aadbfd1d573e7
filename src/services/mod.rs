//! Application services over the domain ports.

pub mod event_facade;
pub mod event_registry;
pub mod plugin_registry;
pub mod rule_scheduler;
pub mod rule_service;
pub mod scheduled_rule_worker;

pub use event_facade::EventFacade;
pub use event_registry::EventRegistry;
pub use plugin_registry::{ComponentInstance, PluginDefinition, PluginRegistry};
pub use rule_scheduler::{RuleScheduler, TickReport, DEFAULT_QUEUE_NAME};
pub use rule_service::RuleService;
pub use scheduled_rule_worker::{ScheduledRuleWorker, WorkOutcome, CONTEXT_SCHEDULE_ID};
