//! Common test utilities for integration tests
//!
//! Provides plugin fixtures, in-memory ports and engine builders over a
//! migrated in-memory SQLite pool.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use event_rules::adapters::sqlite::{
    create_migrated_test_pool, SqliteComponentRepository, SqliteRuleRepository,
    SqliteScheduleRepository,
};
use event_rules::domain::errors::{DomainError, DomainResult};
use event_rules::domain::models::{
    ComponentRecord, EventEntity, EventRef, EventType, Rule, Schedule, ScheduledRulePayload,
    SchedulerConfig,
};
use event_rules::domain::ports::{
    ActionPlugin, ConditionPlugin, ContextDefinition, ContextValues, EventLoader, RuleFilter,
    RuleRepository, ScheduleRepository, WorkQueue,
};
use event_rules::services::{PluginRegistry, RuleService};
use event_rules::RuleEngine;

pub const RECORD_ACTION: &str = "record";
pub const FIXED_CONDITION: &str = "fixed";
pub const USER_ROLE_CONDITION: &str = "user_role";

/// Shared log written by the fixture plugins.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Condition returning `result` from its configuration and journaling
/// `eval:<label>` each time it is evaluated.
struct FixedCondition {
    label: String,
    result: bool,
    journal: Journal,
}

impl ConditionPlugin for FixedCondition {
    fn set_context_value(&mut self, _name: &str, _value: Value) {}

    fn evaluate(&self) -> bool {
        self.journal.push(format!("eval:{}", self.label));
        self.result
    }

    fn summary(&self) -> String {
        format!("always {}", self.result)
    }
}

/// Passes when the user in context (or the default current user) holds any
/// of the configured roles.
struct UserRoleCondition {
    roles: Vec<String>,
    user_roles: Vec<String>,
}

impl ConditionPlugin for UserRoleCondition {
    fn context_definitions(&self) -> BTreeMap<String, ContextDefinition> {
        [("user".to_string(), ContextDefinition::new("user", "User"))]
            .into_iter()
            .collect()
    }

    fn set_context_value(&mut self, name: &str, value: Value) {
        if name == "user" {
            self.user_roles = string_list(&value["roles"]);
        }
    }

    fn evaluate(&self) -> bool {
        self.roles.iter().any(|r| self.user_roles.contains(r))
    }

    fn summary(&self) -> String {
        format!("user has one of: {}", self.roles.join(", "))
    }
}

/// Action journaling `<label>` and the event id it ran for. Fails after
/// journaling when configured with `"fail": true`.
struct RecordAction {
    label: String,
    fail: bool,
    journal: Journal,
}

#[async_trait]
impl ActionPlugin for RecordAction {
    async fn execute(&self, context: &ContextValues) -> DomainResult<()> {
        self.journal.push(self.label.clone());
        if let Some(id) = context.get("event").and_then(|e| e["id"].as_str()) {
            self.journal.push(format!("{}@{id}", self.label));
        }
        if self.fail {
            return Err(DomainError::ActionFailed {
                plugin_id: RECORD_ACTION.to_string(),
                reason: "configured to fail".to_string(),
            });
        }
        Ok(())
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Built-in plugins plus the fixtures above. `current_user_roles` are the
/// roles of the user assumed when the context carries none.
pub fn test_plugins(journal: &Journal, current_user_roles: &[&str]) -> PluginRegistry {
    let fixed_journal = journal.clone();
    let record_journal = journal.clone();
    let default_roles: Vec<String> = current_user_roles.iter().map(|r| (*r).to_string()).collect();

    PluginRegistry::with_builtins()
        .with_condition(FIXED_CONDITION, "Fixed result", move |config| {
            Ok(Box::new(FixedCondition {
                label: config["label"].as_str().unwrap_or_default().to_string(),
                result: config["result"].as_bool().unwrap_or(true),
                journal: fixed_journal.clone(),
            }) as Box<dyn ConditionPlugin>)
        })
        .with_condition(USER_ROLE_CONDITION, "User role", move |config| {
            Ok(Box::new(UserRoleCondition {
                roles: string_list(&config["roles"]),
                user_roles: default_roles.clone(),
            }) as Box<dyn ConditionPlugin>)
        })
        .with_action(RECORD_ACTION, "Record", move |config| {
            Ok(Box::new(RecordAction {
                label: config["label"].as_str().unwrap_or(RECORD_ACTION).to_string(),
                fail: config["fail"].as_bool().unwrap_or(false),
                journal: record_journal.clone(),
            }) as Box<dyn ActionPlugin>)
        })
}

pub fn fixed(label: &str, result: bool) -> ComponentRecord {
    ComponentRecord::condition(FIXED_CONDITION, json!({"label": label, "result": result}))
}

pub fn record(label: &str) -> ComponentRecord {
    ComponentRecord::action(RECORD_ACTION, json!({"label": label}))
}

pub fn failing_record(label: &str) -> ComponentRecord {
    ComponentRecord::action(RECORD_ACTION, json!({"label": label, "fail": true}))
}

pub fn scheduler_condition(date: DateTime<Utc>) -> ComponentRecord {
    ComponentRecord::condition("rule_scheduler", json!({"date": date.to_rfc3339()}))
}

/// Work queue keeping payloads in memory; `set_failing(true)` makes every
/// enqueue fail.
#[derive(Default)]
pub struct MemoryQueue {
    items: Mutex<Vec<(String, ScheduledRulePayload)>>,
    failing: AtomicBool,
}

impl MemoryQueue {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn items(&self) -> Vec<(String, ScheduledRulePayload)> {
        self.items.lock().unwrap().clone()
    }

    pub fn drain(&self) -> Vec<ScheduledRulePayload> {
        self.items.lock().unwrap().drain(..).map(|(_, p)| p).collect()
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn enqueue(&self, queue_name: &str, payload: &ScheduledRulePayload) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::QueueError("queue unavailable".to_string()));
        }
        self.items.lock().unwrap().push((queue_name.to_string(), *payload));
        Ok(())
    }
}

/// Event loader backed by a map.
#[derive(Default)]
pub struct MapEventLoader {
    events: Mutex<HashMap<EventRef, EventEntity>>,
}

impl MapEventLoader {
    pub fn with_event(self, event: EventEntity) -> Self {
        self.events.lock().unwrap().insert(event.reference(), event);
        self
    }

    pub fn remove(&self, event: &EventRef) {
        self.events.lock().unwrap().remove(event);
    }
}

#[async_trait]
impl EventLoader for MapEventLoader {
    async fn load(&self, event: &EventRef) -> DomainResult<Option<EventEntity>> {
        Ok(self.events.lock().unwrap().get(event).cloned())
    }
}

fn storage_down() -> DomainError {
    DomainError::DatabaseError("storage unavailable".to_string())
}

/// Rule repository whose `update` always fails.
pub struct ReadOnlyRules(pub SqliteRuleRepository);

#[async_trait]
impl RuleRepository for ReadOnlyRules {
    async fn create(&self, rule: &Rule) -> DomainResult<()> {
        self.0.create(rule).await
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Rule>> {
        self.0.get(id).await
    }

    async fn update(&self, _rule: &Rule) -> DomainResult<()> {
        Err(storage_down())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.0.delete(id).await
    }

    async fn find(&self, filter: &RuleFilter) -> DomainResult<Vec<Rule>> {
        self.0.find(filter).await
    }

    async fn count(&self, filter: &RuleFilter) -> DomainResult<u64> {
        self.0.count(filter).await
    }
}

/// Schedule repository whose `update` fails while `set_failing(true)`.
pub struct FlakySchedules {
    inner: SqliteScheduleRepository,
    failing: AtomicBool,
}

impl FlakySchedules {
    pub fn new(inner: SqliteScheduleRepository) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScheduleRepository for FlakySchedules {
    async fn create(&self, schedule: &Schedule) -> DomainResult<()> {
        self.inner.create(schedule).await
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Schedule>> {
        self.inner.get(id).await
    }

    async fn get_by_component(&self, component_id: Uuid) -> DomainResult<Option<Schedule>> {
        self.inner.get_by_component(component_id).await
    }

    async fn update(&self, schedule: &Schedule) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(storage_down());
        }
        self.inner.update(schedule).await
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> DomainResult<Vec<Schedule>> {
        self.inner.list().await
    }

    async fn list_due(&self, now: DateTime<Utc>, attempts_max: u32) -> DomainResult<Vec<Schedule>> {
        self.inner.list_due(now, attempts_max).await
    }

    async fn list_expired(&self, attempts_max: u32) -> DomainResult<Vec<Schedule>> {
        self.inner.list_expired(attempts_max).await
    }

    async fn claim(&self, id: Uuid) -> DomainResult<bool> {
        self.inner.claim(id).await
    }

    async fn release(&self, id: Uuid) -> DomainResult<()> {
        self.inner.release(id).await
    }
}

/// Rule service over `pool` whose rule updates always fail.
pub fn read_only_rule_service(pool: &sqlx::SqlitePool) -> Arc<RuleService> {
    Arc::new(RuleService::new(
        Arc::new(ReadOnlyRules(SqliteRuleRepository::new(pool.clone()))),
        Arc::new(SqliteComponentRepository::new(pool.clone())),
        Arc::new(SqliteScheduleRepository::new(pool.clone())),
    ))
}

/// Engine over a fresh in-memory database with the fixture plugins and an
/// in-memory work queue.
pub struct TestEngine {
    pub engine: RuleEngine,
    pub queue: Arc<MemoryQueue>,
    pub journal: Journal,
}

impl TestEngine {
    pub async fn new() -> Self {
        Self::with_current_user_roles(&[]).await
    }

    pub async fn with_current_user_roles(roles: &[&str]) -> Self {
        let pool = create_migrated_test_pool().await.expect("failed to create test pool");
        let journal = Journal::default();
        let queue = Arc::new(MemoryQueue::default());
        let engine = RuleEngine::with_work_queue(
            pool,
            test_plugins(&journal, roles),
            &SchedulerConfig::default(),
            queue.clone(),
        );
        Self { engine, queue, journal }
    }

    pub fn schedules(&self) -> SqliteScheduleRepository {
        SqliteScheduleRepository::new(self.engine.pool().clone())
    }

    /// Register `node.conference` as an event type.
    pub async fn register_conference_type(&self) -> EventType {
        self.engine
            .registry()
            .save_event_type(EventType::new("node", "conference"))
            .await
            .expect("failed to save event type")
    }

    pub async fn save(&self, mut rule: Rule) -> Rule {
        self.engine
            .rules()
            .save_rule(&mut rule)
            .await
            .expect("failed to save rule");
        rule
    }
}

pub fn conference(id: &str) -> EventEntity {
    EventEntity::new("node", "conference", id).with_label(format!("Conference {id}"))
}

pub fn past() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0) - Duration::hours(1)
}

pub fn future() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0) + Duration::days(7)
}
