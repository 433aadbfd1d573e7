mod common;

use event_rules::domain::models::{ComponentRecord, EventRef, Rule};
use event_rules::domain::ports::ContextValues;
use proptest::prelude::*;
use serde_json::json;

use common::{fixed, record, test_plugins, Journal, USER_ROLE_CONDITION};

fn rule() -> Rule {
    Rule::new(EventRef::new("node", "1"), "registration")
}

#[test]
fn test_rule_without_conditions_passes() {
    let journal = Journal::default();
    let plugins = test_plugins(&journal, &[]);

    let rule = rule().with_component(record("grant"));
    assert!(rule.evaluate_conditions(&plugins, &ContextValues::new()));
}

#[test]
fn test_evaluation_stops_at_first_false_condition() {
    let journal = Journal::default();
    let plugins = test_plugins(&journal, &[]);

    let rule = rule()
        .with_component(fixed("first", true))
        .with_component(fixed("second", false))
        .with_component(fixed("third", true));

    assert!(!rule.evaluate_conditions(&plugins, &ContextValues::new()));
    assert_eq!(journal.entries(), vec!["eval:first", "eval:second"]);
}

#[test]
fn test_all_true_conditions_pass() {
    let journal = Journal::default();
    let plugins = test_plugins(&journal, &[]);

    let rule = rule()
        .with_component(fixed("a", true))
        .with_component(fixed("b", true));

    assert!(rule.evaluate_conditions(&plugins, &ContextValues::new()));
    assert_eq!(journal.entries(), vec!["eval:a", "eval:b"]);
}

#[test]
fn test_unknown_condition_plugin_fails_rule_but_later_conditions_run() {
    let journal = Journal::default();
    let plugins = test_plugins(&journal, &[]);

    let rule = rule()
        .with_component(ComponentRecord::condition("missing", json!({})))
        .with_component(fixed("after", true));

    assert!(!rule.evaluate_conditions(&plugins, &ContextValues::new()));
    assert_eq!(journal.entries(), vec!["eval:after"]);
}

#[test]
fn test_invalid_configuration_fails_rule() {
    let journal = Journal::default();
    let plugins = test_plugins(&journal, &[]);

    let rule = rule().with_component(ComponentRecord::condition("current_time", json!({"date": "soon"})));
    assert!(!rule.evaluate_conditions(&plugins, &ContextValues::new()));
}

#[test]
fn test_condition_receives_declared_context() {
    let journal = Journal::default();
    let plugins = test_plugins(&journal, &[]);

    let rule = rule().with_component(ComponentRecord::condition(
        USER_ROLE_CONDITION,
        json!({"roles": ["organizer"]}),
    ));

    let mut context = ContextValues::new();
    context.insert("user".to_string(), json!({"roles": ["attendee"]}));
    assert!(!rule.evaluate_conditions(&plugins, &context));

    context.insert("user".to_string(), json!({"roles": ["attendee", "organizer"]}));
    assert!(rule.evaluate_conditions(&plugins, &context));
}

#[test]
fn test_actions_do_not_affect_evaluation() {
    let journal = Journal::default();
    let plugins = test_plugins(&journal, &[]);

    let rule = rule()
        .with_component(fixed("only", false))
        .with_component(record("grant"));

    assert!(!rule.evaluate_conditions(&plugins, &ContextValues::new()));
    assert_eq!(journal.count("grant"), 0);
}

proptest! {
    /// Property: the result is the conjunction of the condition results and
    /// evaluation stops right after the first false one.
    #[test]
    fn prop_evaluation_is_short_circuit_conjunction(results in prop::collection::vec(any::<bool>(), 0..12)) {
        let journal = Journal::default();
        let plugins = test_plugins(&journal, &[]);

        let mut rule = rule();
        for (i, result) in results.iter().enumerate() {
            rule.add_component(fixed(&i.to_string(), *result));
        }

        let passed = rule.evaluate_conditions(&plugins, &ContextValues::new());
        prop_assert_eq!(passed, results.iter().all(|r| *r));

        let expected_evaluations = results
            .iter()
            .position(|r| !*r)
            .map_or(results.len(), |first_false| first_false + 1);
        prop_assert_eq!(journal.entries().len(), expected_evaluations);
    }
}
