//! `current_time` condition: passes once the configured date has been reached.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{parse_date_config, parse_negate};
use crate::domain::errors::DomainResult;
use crate::domain::ports::plugin::ConditionPlugin;

pub const CURRENT_TIME_PLUGIN_ID: &str = "current_time";

#[derive(Debug, Clone)]
pub struct CurrentTimeCondition {
    date: DateTime<Utc>,
    negate: bool,
}

impl CurrentTimeCondition {
    pub fn new(date: DateTime<Utc>) -> Self {
        Self { date, negate: false }
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Build from `{"date": RFC3339, "negate": bool}`.
    pub fn from_config(configuration: &Value) -> DomainResult<Self> {
        Ok(Self {
            date: parse_date_config(CURRENT_TIME_PLUGIN_ID, configuration)?,
            negate: parse_negate(configuration),
        })
    }

    pub fn evaluate_at(&self, now: DateTime<Utc>) -> bool {
        (now >= self.date) != self.negate
    }
}

impl ConditionPlugin for CurrentTimeCondition {
    fn set_context_value(&mut self, _name: &str, _value: Value) {}

    fn evaluate(&self) -> bool {
        self.evaluate_at(Utc::now())
    }

    fn summary(&self) -> String {
        if self.negate {
            format!("Current time is before {}", self.date.to_rfc3339())
        } else {
            format!("Current time is after {}", self.date.to_rfc3339())
        }
    }
}
