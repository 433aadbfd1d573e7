pub mod component;
pub mod config;
pub mod event;
pub mod event_type;
pub mod rule;
pub mod rule_template;
pub mod schedule;

pub use component::{ComponentRecord, ComponentType};
pub use config::{Config, DatabaseConfig, LoggingConfig, SchedulerConfig};
pub use event::{EventEntity, EventRef};
pub use event_type::{EventType, IdentityTypeRef, IdentityTypeSettings};
pub use rule::{Rule, REGISTRATION_TRIGGER};
pub use rule_template::RuleTemplate;
pub use schedule::{Schedule, ScheduledRulePayload, ATTEMPTS_MAX, RULE_SCHEDULER_PLUGIN_ID};
