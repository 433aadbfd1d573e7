//! Event type configuration keyed by `(entity_type, bundle)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operation mirrored as "manage event" when nothing else is configured.
pub const DEFAULT_MANAGE_OPERATION: &str = "update";

/// Reference to an identity (registrant) type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityTypeRef {
    pub entity_type: String,
    pub bundle: String,
}

impl IdentityTypeRef {
    pub fn new(entity_type: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
        }
    }
}

/// Whether an identity type may be created and/or referenced as a registrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityTypeSettings {
    pub entity_type: String,
    pub bundle: String,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub reference: bool,
}

/// Marks a `(entity_type, bundle)` pair as an event and holds its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventType {
    pub entity_type: String,
    pub bundle: String,
    #[serde(default)]
    pub identity_types: Vec<IdentityTypeSettings>,
    #[serde(default)]
    pub default_registrant_type: Option<IdentityTypeRef>,
    /// Operation on the event entity that grants "manage event".
    #[serde(default = "default_manage_operation")]
    pub event_manage_operation: String,
    /// Whether events of this type may carry their own rules.
    #[serde(default = "default_true")]
    pub custom_rules: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_manage_operation() -> String {
    DEFAULT_MANAGE_OPERATION.to_string()
}

const fn default_true() -> bool {
    true
}

impl EventType {
    pub fn new(entity_type: impl Into<String>, bundle: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            identity_types: Vec::new(),
            default_registrant_type: None,
            event_manage_operation: default_manage_operation(),
            custom_rules: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_identity_type(mut self, settings: IdentityTypeSettings) -> Self {
        self.identity_types.push(settings);
        self
    }

    pub fn with_default_registrant(mut self, registrant: IdentityTypeRef) -> Self {
        self.default_registrant_type = Some(registrant);
        self
    }

    pub fn with_custom_rules(mut self, allowed: bool) -> Self {
        self.custom_rules = allowed;
        self
    }

    /// Configuration id, `entity_type.bundle`.
    pub fn id(&self) -> String {
        format!("{}.{}", self.entity_type, self.bundle)
    }

    pub fn identity_settings(
        &self,
        entity_type: &str,
        bundle: &str,
    ) -> Option<&IdentityTypeSettings> {
        self.identity_types
            .iter()
            .find(|s| s.entity_type == entity_type && s.bundle == bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let yaml = r"
entity_type: node
bundle: conference
identity_types:
  - entity_type: user
    bundle: user
    reference: true
";
        let event_type: EventType = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(event_type.id(), "node.conference");
        assert_eq!(event_type.event_manage_operation, "update");
        assert!(event_type.custom_rules);

        let user = event_type.identity_settings("user", "user").unwrap();
        assert!(user.reference);
        assert!(!user.create);
        assert!(event_type.identity_settings("contact", "person").is_none());
    }
}
