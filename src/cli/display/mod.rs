//! Display helpers for CLI output: colors, list tables and detail views.
//!
//! Styling goes through `console`, which drops colors when stdout is not a
//! terminal or `NO_COLOR` is set.

pub mod colors;
pub mod detail;
pub mod table;

pub use colors::{colorize_active, colorize_component_type};
pub use detail::DetailView;
pub use table::{list_table, render_list};
