//! Infrastructure adapters: SQLite storage and the built-in plugins.

pub mod plugins;
pub mod sqlite;
