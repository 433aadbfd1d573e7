//! SQLite adapter for ScheduleRepository.
//!
//! Trigger dates are stored as epoch milliseconds so due checks compare
//! integers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Schedule;
use crate::domain::ports::ScheduleRepository;

#[derive(Clone)]
pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: String,
    component_id: String,
    trigger_at_ms: i64,
    in_queue: i32,
    attempts: i64,
    created_at: String,
    updated_at: String,
}

fn row_to_schedule(row: ScheduleRow) -> DomainResult<Schedule> {
    let trigger_date = DateTime::<Utc>::from_timestamp_millis(row.trigger_at_ms).ok_or_else(|| {
        DomainError::SerializationError(format!("trigger_at_ms out of range: {}", row.trigger_at_ms))
    })?;

    Ok(Schedule {
        id: parse_uuid(&row.id)?,
        component_id: parse_uuid(&row.component_id)?,
        trigger_date,
        in_queue: row.in_queue != 0,
        attempts: u32::try_from(row.attempts).unwrap_or(u32::MAX),
        created_at: parse_datetime(&row.created_at)?,
        updated_at: parse_datetime(&row.updated_at)?,
    })
}

#[async_trait]
impl ScheduleRepository for SqliteScheduleRepository {
    async fn create(&self, schedule: &Schedule) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO rule_schedules
             (id, component_id, trigger_at_ms, in_queue, attempts, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(schedule.id.to_string())
        .bind(schedule.component_id.to_string())
        .bind(schedule.trigger_date.timestamp_millis())
        .bind(i32::from(schedule.in_queue))
        .bind(i64::from(schedule.attempts))
        .bind(schedule.created_at.to_rfc3339())
        .bind(schedule.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Schedule>> {
        let row: Option<ScheduleRow> = sqlx::query_as("SELECT * FROM rule_schedules WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_schedule).transpose()
    }

    async fn get_by_component(&self, component_id: Uuid) -> DomainResult<Option<Schedule>> {
        let row: Option<ScheduleRow> = sqlx::query_as("SELECT * FROM rule_schedules WHERE component_id = ?")
            .bind(component_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_schedule).transpose()
    }

    async fn update(&self, schedule: &Schedule) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE rule_schedules SET trigger_at_ms = ?, in_queue = ?, attempts = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(schedule.trigger_date.timestamp_millis())
        .bind(i32::from(schedule.in_queue))
        .bind(i64::from(schedule.attempts))
        .bind(schedule.updated_at.to_rfc3339())
        .bind(schedule.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ScheduleNotFound(schedule.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        sqlx::query("DELETE FROM rule_schedules WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = sqlx::query_as("SELECT * FROM rule_schedules ORDER BY trigger_at_ms, id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_schedule).collect()
    }

    async fn list_due(&self, now: DateTime<Utc>, attempts_max: u32) -> DomainResult<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(
            "SELECT * FROM rule_schedules
             WHERE trigger_at_ms <= ? AND in_queue = 0 AND attempts <= ?
             ORDER BY trigger_at_ms, id",
        )
        .bind(now.timestamp_millis())
        .bind(i64::from(attempts_max))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_schedule).collect()
    }

    async fn list_expired(&self, attempts_max: u32) -> DomainResult<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = sqlx::query_as("SELECT * FROM rule_schedules WHERE attempts > ? ORDER BY id")
            .bind(i64::from(attempts_max))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_schedule).collect()
    }

    async fn claim(&self, id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE rule_schedules SET in_queue = 1, updated_at = ? WHERE id = ? AND in_queue = 0",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, id: Uuid) -> DomainResult<()> {
        sqlx::query("UPDATE rule_schedules SET in_queue = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
