//! Built-in condition plugins.
//!
//! User-facing conditions and actions (role checks, mail, registration
//! operations) are supplied by the host through
//! [`PluginRegistry`](crate::services::plugin_registry::PluginRegistry).
//! Only the time-based conditions the scheduler depends on ship here.

pub mod current_time;
pub mod rule_scheduler;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::errors::{DomainError, DomainResult};

pub use current_time::CurrentTimeCondition;
pub use rule_scheduler::RuleSchedulerCondition;

/// Read the RFC 3339 `date` key shared by the time conditions.
pub(crate) fn parse_date_config(
    plugin_id: &str,
    configuration: &Value,
) -> DomainResult<DateTime<Utc>> {
    let raw = configuration
        .get("date")
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::InvalidConfiguration {
            plugin_id: plugin_id.to_string(),
            reason: "missing 'date'".to_string(),
        })?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::InvalidConfiguration {
            plugin_id: plugin_id.to_string(),
            reason: format!("invalid date '{raw}': {e}"),
        })
}

fn parse_negate(configuration: &Value) -> bool {
    configuration
        .get("negate")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_date_config() {
        let date = parse_date_config("current_time", &json!({"date": "2030-05-01T10:00:00+02:00"})).unwrap();
        assert_eq!(date.to_rfc3339(), "2030-05-01T08:00:00+00:00");

        let err = parse_date_config("current_time", &json!({})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfiguration { .. }));

        let err = parse_date_config("current_time", &json!({"date": "tomorrow"})).unwrap_err();
        assert!(err.to_string().contains("tomorrow"));
    }
}
