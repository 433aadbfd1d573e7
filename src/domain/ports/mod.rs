//! Port trait definitions (Hexagonal Architecture)
//!
//! Storage, queue and host contracts the services depend on, plus the
//! condition/action plugin contracts.

pub mod component_repository;
pub mod event_loader;
pub mod event_type_repository;
pub mod plugin;
pub mod rule_repository;
pub mod rule_template_repository;
pub mod schedule_repository;
pub mod work_queue;

pub use component_repository::ComponentRepository;
pub use event_loader::EventLoader;
pub use event_type_repository::EventTypeRepository;
pub use plugin::{ActionPlugin, ConditionPlugin, ContextDefinition, ContextValues, CONTEXT_EVENT};
pub use rule_repository::{RuleFilter, RuleRepository};
pub use rule_template_repository::RuleTemplateRepository;
pub use schedule_repository::ScheduleRepository;
pub use work_queue::WorkQueue;
