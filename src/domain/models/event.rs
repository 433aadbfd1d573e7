//! Host-owned event objects.
//!
//! An event is any host object identified by `(entity_type, id)`. It only
//! becomes an event for this engine when an [`EventType`](super::EventType)
//! exists for its `(entity_type, bundle)` pair.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute holding the registration capacity. Negative or missing means unlimited.
pub const ATTRIBUTE_CAPACITY: &str = "capacity";

/// Attribute holding whether the event currently accepts registrations.
pub const ATTRIBUTE_REGISTRATION_OPEN: &str = "registration_open";

/// Polymorphic reference to an event: entity type plus identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventRef {
    pub entity_type: String,
    pub id: String,
}

impl EventRef {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Parse the `entity_type:id` form used on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        let (entity_type, id) = s.split_once(':')?;
        if entity_type.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(entity_type, id))
    }
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

/// A snapshot of a host object that may carry rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntity {
    pub entity_type: String,
    pub bundle: String,
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Free-form host fields. Only a couple are interpreted here.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EventEntity {
    pub fn new(
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            id: id.into(),
            label: String::new(),
            attributes: Map::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn reference(&self) -> EventRef {
        EventRef::new(&self.entity_type, &self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ref_parse() {
        let r = EventRef::parse("node:42").unwrap();
        assert_eq!(r.entity_type, "node");
        assert_eq!(r.id, "42");
        assert_eq!(r.to_string(), "node:42");

        assert!(EventRef::parse("node").is_none());
        assert!(EventRef::parse(":42").is_none());
        assert!(EventRef::parse("node:").is_none());
    }

    #[test]
    fn test_reference_ignores_bundle() {
        let event = EventEntity::new("node", "conference", "7").with_label("RustConf");
        assert_eq!(event.reference(), EventRef::new("node", "7"));
    }
}
