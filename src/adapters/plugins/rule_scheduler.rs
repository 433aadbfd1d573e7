//! `rule_scheduler` condition.
//!
//! Passes once its date is reached. Saving a rule that carries this condition
//! creates a [`Schedule`](crate::domain::models::Schedule) mirroring the date,
//! and the scheduler tick hands the rule to the queue when it comes due.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::parse_date_config;
use crate::domain::errors::DomainResult;
use crate::domain::models::RULE_SCHEDULER_PLUGIN_ID;
use crate::domain::ports::plugin::{ConditionPlugin, ContextDefinition};

#[derive(Debug, Clone)]
pub struct RuleSchedulerCondition {
    date: DateTime<Utc>,
    schedule_id: Option<String>,
}

impl RuleSchedulerCondition {
    pub fn new(date: DateTime<Utc>) -> Self {
        Self { date, schedule_id: None }
    }

    pub fn from_config(configuration: &Value) -> DomainResult<Self> {
        Ok(Self::new(Self::configured_date(configuration)?))
    }

    /// The fire time stored in a scheduler condition's configuration.
    pub fn configured_date(configuration: &Value) -> DomainResult<DateTime<Utc>> {
        parse_date_config(RULE_SCHEDULER_PLUGIN_ID, configuration)
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Schedule id received from the worker context, if any.
    pub fn schedule_id(&self) -> Option<&str> {
        self.schedule_id.as_deref()
    }
}

impl ConditionPlugin for RuleSchedulerCondition {
    fn context_definitions(&self) -> std::collections::BTreeMap<String, ContextDefinition> {
        [("schedule_id".to_string(), ContextDefinition::new("string", "Schedule"))]
            .into_iter()
            .collect()
    }

    fn set_context_value(&mut self, name: &str, value: Value) {
        if name == "schedule_id" {
            self.schedule_id = value.as_str().map(str::to_string);
        }
    }

    fn evaluate(&self) -> bool {
        Utc::now() >= self.date
    }

    fn summary(&self) -> String {
        format!("Run on {}", self.date.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_configured_date() {
        let date = RuleSchedulerCondition::configured_date(&json!({"date": "2031-03-04T05:06:07Z"})).unwrap();
        assert_eq!(date.to_rfc3339(), "2031-03-04T05:06:07+00:00");
        assert!(RuleSchedulerCondition::configured_date(&json!({"when": 1})).is_err());
    }

    #[test]
    fn test_receives_schedule_id_from_context() {
        let mut condition = RuleSchedulerCondition::new(Utc::now());
        assert!(condition.context_definitions().contains_key("schedule_id"));
        condition.set_context_value("schedule_id", json!("abc"));
        condition.set_context_value("event", json!({"id": "1"}));
        assert_eq!(condition.schedule_id(), Some("abc"));
        assert!(condition.evaluate());
    }
}
