mod common;

use std::sync::Arc;

use event_rules::domain::errors::DomainError;
use event_rules::domain::models::{
    EventEntity, EventType, IdentityTypeRef, IdentityTypeSettings, Rule, RuleTemplate, REGISTRATION_TRIGGER,
};
use event_rules::domain::ports::ContextValues;
use serde_json::json;

use common::{conference, failing_record, fixed, record, TestEngine, FIXED_CONDITION, RECORD_ACTION};

fn default_template(machine_name: &str) -> RuleTemplate {
    RuleTemplate::new("node", "conference", REGISTRATION_TRIGGER, machine_name)
        .with_condition(FIXED_CONDITION, json!({"label": machine_name, "result": true}))
        .with_action(RECORD_ACTION, json!({"label": format!("{machine_name}-grant")}))
}

#[tokio::test]
async fn test_default_rules_used_when_event_has_none() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let registry = t.engine.registry();
    registry.save_template(default_template("open")).await.expect("failed to save template");

    let facade = registry.get_facade(&conference("1")).await.expect("failed to get facade");

    let defaults = facade
        .get_rules(Some(REGISTRATION_TRIGGER), true, true)
        .await
        .expect("failed to get rules");
    assert_eq!(defaults.len(), 1);
    let rule = &defaults[0];
    assert!(rule.is_new());
    assert_eq!(rule.event, conference("1").reference());
    assert_eq!(rule.trigger, REGISTRATION_TRIGGER);
    let condition = rule.conditions().next().unwrap();
    assert_eq!(condition.plugin_id, FIXED_CONDITION);
    assert_eq!(condition.configuration, json!({"label": "open", "result": true}));
    let action = rule.actions().next().unwrap();
    assert_eq!(action.configuration, json!({"label": "open-grant"}));

    let without_defaults = facade
        .get_rules(Some(REGISTRATION_TRIGGER), false, true)
        .await
        .expect("failed to get rules");
    assert!(without_defaults.is_empty());
    assert!(facade.is_using_defaults(REGISTRATION_TRIGGER).await.unwrap());
}

#[tokio::test]
async fn test_defaults_only_apply_to_registration_trigger() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let registry = t.engine.registry();
    registry
        .save_template(
            RuleTemplate::new("node", "conference", "reminder", "weekly")
                .with_action(RECORD_ACTION, json!({"label": "remind"})),
        )
        .await
        .expect("failed to save template");

    let facade = registry.get_facade(&conference("1")).await.unwrap();
    let rules = facade.get_rules(Some("reminder"), true, true).await.unwrap();
    assert!(rules.is_empty());
    let rules = facade.get_rules(None, true, true).await.unwrap();
    assert!(rules.is_empty());
}

#[tokio::test]
async fn test_stored_rules_replace_defaults() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let registry = t.engine.registry();
    registry.save_template(default_template("open")).await.unwrap();

    let own = t
        .save(Rule::new(conference("1").reference(), REGISTRATION_TRIGGER).with_component(record("own")))
        .await;

    let facade = registry.get_facade(&conference("1")).await.unwrap();
    let rules = facade.get_rules(Some(REGISTRATION_TRIGGER), true, true).await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, own.id);
    assert!(!facade.is_using_defaults(REGISTRATION_TRIGGER).await.unwrap());

    // Other events of the same type still get the defaults.
    let other = registry.get_facade(&conference("2")).await.unwrap();
    let rules = other.get_rules(Some(REGISTRATION_TRIGGER), true, true).await.unwrap();
    assert!(rules[0].is_new());
}

#[tokio::test]
async fn test_promote_defaults_is_idempotent() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let registry = t.engine.registry();
    registry.save_template(default_template("open")).await.unwrap();
    registry.save_template(default_template("waitlist")).await.unwrap();

    let facade = registry.get_facade(&conference("1")).await.unwrap();
    let promoted = facade
        .promote_defaults_to_custom(REGISTRATION_TRIGGER)
        .await
        .expect("failed to promote");
    assert_eq!(promoted.len(), 2);
    assert!(promoted.iter().all(|r| r.id.is_some()));

    let again = facade.promote_defaults_to_custom(REGISTRATION_TRIGGER).await.unwrap();
    assert!(again.is_empty());

    let stored = facade.get_rules(Some(REGISTRATION_TRIGGER), false, false).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|r| r.components().count() == 2));
}

#[tokio::test]
async fn test_inactive_rules_do_not_block_promotion() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let registry = t.engine.registry();
    registry.save_template(default_template("open")).await.unwrap();

    t.save(
        Rule::new(conference("1").reference(), REGISTRATION_TRIGGER)
            .with_active(false)
            .with_component(record("paused")),
    )
    .await;

    let facade = registry.get_facade(&conference("1")).await.unwrap();
    assert!(facade.is_using_defaults(REGISTRATION_TRIGGER).await.unwrap());

    let promoted = facade.promote_defaults_to_custom(REGISTRATION_TRIGGER).await.unwrap();
    assert_eq!(promoted.len(), 1);
    assert!(!facade.is_using_defaults(REGISTRATION_TRIGGER).await.unwrap());
    assert!(facade
        .promote_defaults_to_custom(REGISTRATION_TRIGGER)
        .await
        .unwrap()
        .is_empty());

    let stored = facade.get_rules(Some(REGISTRATION_TRIGGER), false, false).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn test_trigger_runs_actions_of_passing_rules() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let event = conference("7");

    t.save(
        Rule::new(event.reference(), REGISTRATION_TRIGGER)
            .with_component(fixed("pass", true))
            .with_component(record("first"))
            .with_component(record("second")),
    )
    .await;
    t.save(
        Rule::new(event.reference(), REGISTRATION_TRIGGER)
            .with_component(fixed("block", false))
            .with_component(record("blocked")),
    )
    .await;
    t.save(
        Rule::new(event.reference(), REGISTRATION_TRIGGER)
            .with_active(false)
            .with_component(record("inactive")),
    )
    .await;

    let facade = t.engine.registry().get_facade(&event).await.unwrap();
    let passed = facade
        .trigger(REGISTRATION_TRIGGER, ContextValues::new())
        .await
        .expect("failed to trigger");

    assert_eq!(passed, 1);
    assert_eq!(t.journal.count("first"), 1);
    assert_eq!(t.journal.count("second"), 1);
    assert_eq!(t.journal.count("first@7"), 1);
    assert_eq!(t.journal.count("blocked"), 0);
    assert_eq!(t.journal.count("inactive"), 0);
}

#[tokio::test]
async fn test_trigger_continues_after_action_failure() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let event = conference("1");

    t.save(
        Rule::new(event.reference(), REGISTRATION_TRIGGER)
            .with_component(failing_record("broken"))
            .with_component(record("after")),
    )
    .await;

    let facade = t.engine.registry().get_facade(&event).await.unwrap();
    let passed = facade.trigger(REGISTRATION_TRIGGER, ContextValues::new()).await.unwrap();

    assert_eq!(passed, 1);
    assert_eq!(t.journal.entries().iter().filter(|e| e.starts_with("broken")).count(), 2);
    assert_eq!(t.journal.count("after"), 1);
}

#[tokio::test]
async fn test_trigger_ignores_default_rules() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    t.engine.registry().save_template(default_template("open")).await.unwrap();

    let facade = t.engine.registry().get_facade(&conference("1")).await.unwrap();
    let passed = facade.trigger(REGISTRATION_TRIGGER, ContextValues::new()).await.unwrap();

    assert_eq!(passed, 0);
    assert!(t.journal.entries().is_empty());
}

#[tokio::test]
async fn test_unregistered_entity_is_not_an_event() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let page = EventEntity::new("node", "page", "3");

    assert!(!t.engine.registry().is_event(&page).await.unwrap());
    assert!(t.engine.registry().is_event(&conference("3")).await.unwrap());

    let err = t.engine.registry().get_facade(&page).await.err().unwrap();
    assert!(matches!(err, DomainError::NotAnEvent { ref bundle, .. } if bundle == "page"));
}

#[tokio::test]
async fn test_facade_cache_and_invalidation() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let registry = t.engine.registry();
    let event = conference("1");

    let first = registry.get_facade(&event).await.unwrap();
    let second = registry.get_facade(&event).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.cached_facades().await, 1);

    registry.invalidate(&event.reference()).await;
    let third = registry.get_facade(&event).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &third));

    // Saving an event type drops every cached facade.
    registry
        .save_event_type(EventType::new("node", "conference").with_custom_rules(false))
        .await
        .unwrap();
    assert_eq!(registry.cached_facades().await, 0);
    let fresh = registry.get_facade(&event).await.unwrap();
    assert!(!fresh.custom_rules_allowed());
}

#[tokio::test]
async fn test_identity_and_capacity_settings() {
    let t = TestEngine::new().await;
    let registry = t.engine.registry();
    registry
        .save_event_type(
            EventType::new("node", "conference")
                .with_identity_type(IdentityTypeSettings {
                    entity_type: "user".to_string(),
                    bundle: "user".to_string(),
                    create: false,
                    reference: true,
                })
                .with_default_registrant(IdentityTypeRef::new("user", "user")),
        )
        .await
        .unwrap();

    let event = conference("1")
        .with_attribute("capacity", json!(10))
        .with_attribute("registration_open", json!(true));
    let facade = registry.get_facade(&event).await.unwrap();

    assert!(facade.can_reference_identity("user", "user"));
    assert!(!facade.can_create_identity("user", "user"));
    assert!(!facade.can_reference_identity("contact", "person"));
    assert_eq!(facade.default_registrant_type(), Some(&IdentityTypeRef::new("user", "user")));
    assert_eq!(facade.manage_operation(), "update");
    assert_eq!(facade.capacity(), Some(10));
    assert_eq!(facade.remaining_capacity(4), Some(6));
    assert_eq!(facade.remaining_capacity(12), Some(0));
    assert!(facade.is_accepting_registrations());

    let unlimited = registry
        .get_facade(&conference("2").with_attribute("capacity", json!(-1)))
        .await
        .unwrap();
    assert_eq!(unlimited.capacity(), None);
    assert_eq!(unlimited.remaining_capacity(100), None);
    assert!(!unlimited.is_accepting_registrations());
}

#[tokio::test]
async fn test_delete_event_type_removes_templates() {
    let t = TestEngine::new().await;
    t.register_conference_type().await;
    let registry = t.engine.registry();
    registry.save_template(default_template("open")).await.unwrap();

    registry.delete_event_type("node", "conference").await.unwrap();

    assert!(registry.list_templates().await.unwrap().is_empty());
    assert!(registry.get_event_type("node", "conference").await.unwrap().is_none());
    let err = registry.save_template(default_template("open")).await.err().unwrap();
    assert!(matches!(err, DomainError::NotAnEvent { .. }));
}
