//! Wiring of the rule engine over one SQLite pool.
//!
//! [`RuleEngine`] owns the repositories and services that make up a running
//! engine. Hosts register their plugins, open the engine, and then use the
//! registry for trigger-time work and the scheduler for cron ticks.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::adapters::sqlite::{
    initialize_database, PoolConfig, SqliteComponentRepository, SqliteEventTypeRepository,
    SqliteRuleRepository, SqliteRuleTemplateRepository, SqliteScheduleRepository, SqliteWorkQueue,
};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, SchedulerConfig, Schedule};
use crate::domain::ports::{EventLoader, ScheduleRepository, WorkQueue};
use crate::services::{
    EventRegistry, PluginRegistry, RuleScheduler, RuleService, ScheduledRuleWorker, WorkOutcome,
};

pub struct RuleEngine {
    pool: SqlitePool,
    plugins: Arc<PluginRegistry>,
    schedules: Arc<SqliteScheduleRepository>,
    queue: SqliteWorkQueue,
    queue_name: String,
    rules: Arc<RuleService>,
    registry: Arc<EventRegistry>,
    scheduler: Arc<RuleScheduler>,
}

impl RuleEngine {
    /// Build an engine that enqueues into the pool's own `queue_items` table.
    pub fn new(pool: SqlitePool, plugins: PluginRegistry, scheduler: &SchedulerConfig) -> Self {
        let queue: Arc<dyn WorkQueue> = Arc::new(SqliteWorkQueue::new(pool.clone()));
        Self::with_work_queue(pool, plugins, scheduler, queue)
    }

    /// Build an engine that hands due schedules to an external queue.
    pub fn with_work_queue(
        pool: SqlitePool,
        plugins: PluginRegistry,
        scheduler: &SchedulerConfig,
        work_queue: Arc<dyn WorkQueue>,
    ) -> Self {
        let plugins = Arc::new(plugins);
        let schedules = Arc::new(SqliteScheduleRepository::new(pool.clone()));

        let rules = Arc::new(RuleService::new(
            Arc::new(SqliteRuleRepository::new(pool.clone())),
            Arc::new(SqliteComponentRepository::new(pool.clone())),
            schedules.clone(),
        ));
        let registry = Arc::new(EventRegistry::new(
            Arc::new(SqliteEventTypeRepository::new(pool.clone())),
            Arc::new(SqliteRuleTemplateRepository::new(pool.clone())),
            Arc::clone(&rules),
            Arc::clone(&plugins),
        ));
        let rule_scheduler = Arc::new(
            RuleScheduler::new(schedules.clone(), Arc::clone(&rules), work_queue)
                .with_queue_name(scheduler.queue_name.clone()),
        );

        Self {
            queue: SqliteWorkQueue::new(pool.clone()),
            pool,
            plugins,
            schedules,
            queue_name: scheduler.queue_name.clone(),
            rules,
            registry,
            scheduler: rule_scheduler,
        }
    }

    /// Open (and migrate) the configured database.
    pub async fn open(config: &Config, plugins: PluginRegistry) -> Result<Self> {
        let pool_config = PoolConfig::from(&config.database);
        let pool = initialize_database(&config.database.url(), Some(pool_config))
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;
        Ok(Self::new(pool, plugins, &config.scheduler))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }

    pub fn rules(&self) -> &Arc<RuleService> {
        &self.rules
    }

    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    pub fn scheduler(&self) -> &Arc<RuleScheduler> {
        &self.scheduler
    }

    pub fn queue(&self) -> &SqliteWorkQueue {
        &self.queue
    }

    pub async fn list_schedules(&self) -> DomainResult<Vec<Schedule>> {
        self.schedules.list().await
    }

    /// A queue consumer resolving events through the host's loader.
    pub fn worker(&self, events: Arc<dyn EventLoader>) -> ScheduledRuleWorker {
        ScheduledRuleWorker::new(
            self.schedules.clone(),
            Arc::clone(&self.rules),
            events,
            Arc::clone(&self.plugins),
        )
    }

    /// Drain up to `max` items of the local queue through `worker`.
    ///
    /// An item is acknowledged only after the worker returns an outcome. When
    /// processing fails the item stays at the head of the queue and the error
    /// is returned, so the next call delivers it again.
    pub async fn process_queue(
        &self,
        worker: &ScheduledRuleWorker,
        max: usize,
    ) -> DomainResult<Vec<WorkOutcome>> {
        let mut outcomes = Vec::new();
        while outcomes.len() < max {
            let Some(item) = self.queue.peek(&self.queue_name).await? else {
                break;
            };
            let outcome = worker.process(&item.payload).await?;
            self.queue.ack(item.id).await?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
