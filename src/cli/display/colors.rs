//! Color mapping for rule states.

use console::{style, StyledObject};

/// Green "active" or dimmed "inactive".
pub fn colorize_active(active: bool) -> StyledObject<&'static str> {
    if active {
        style("active").green().bold()
    } else {
        style("inactive").dim()
    }
}

/// Conditions in cyan, actions in magenta.
pub fn colorize_component_type(component_type: &str) -> StyledObject<&str> {
    match component_type {
        "condition" => style(component_type).cyan(),
        "action" => style(component_type).magenta(),
        _ => style(component_type),
    }
}
