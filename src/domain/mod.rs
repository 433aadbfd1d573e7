//! Domain layer for the event rules engine
//!
//! Models, storage/plugin ports and the error type shared by every layer.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
