//! CLI command implementations.

pub mod event_type;
pub mod init;
pub mod plugin;
pub mod rule;
pub mod run;
pub mod schedule;
pub mod tick;
