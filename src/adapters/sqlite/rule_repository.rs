//! SQLite adapter for RuleRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EventRef, Rule};
use crate::domain::ports::{RuleFilter, RuleRepository};

#[derive(Clone)]
pub struct SqliteRuleRepository {
    pool: SqlitePool,
}

impl SqliteRuleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    id: String,
    event_entity_type: String,
    event_id: String,
    trigger_name: String,
    active: i32,
    created_at: String,
    updated_at: String,
}

fn row_to_rule(row: RuleRow) -> DomainResult<Rule> {
    Ok(Rule::restore(
        parse_uuid(&row.id)?,
        EventRef::new(row.event_entity_type, row.event_id),
        row.trigger_name,
        row.active != 0,
        parse_datetime(&row.created_at)?,
        parse_datetime(&row.updated_at)?,
    ))
}

/// `WHERE` clause and its bindings for a filter.
fn filter_clause(filter: &RuleFilter) -> (String, Vec<String>) {
    let mut clause = String::from(" WHERE 1=1");
    let mut bindings = Vec::new();

    if let Some(event) = &filter.event {
        clause.push_str(" AND event_entity_type = ? AND event_id = ?");
        bindings.push(event.entity_type.clone());
        bindings.push(event.id.clone());
    }
    if let Some(trigger) = &filter.trigger {
        clause.push_str(" AND trigger_name = ?");
        bindings.push(trigger.clone());
    }
    if let Some(active) = filter.active {
        clause.push_str(" AND active = ?");
        bindings.push(i32::from(active).to_string());
    }

    (clause, bindings)
}

#[async_trait]
impl RuleRepository for SqliteRuleRepository {
    async fn create(&self, rule: &Rule) -> DomainResult<()> {
        let id = rule
            .id
            .ok_or_else(|| DomainError::ValidationFailed("rule id must be assigned before insert".to_string()))?;

        sqlx::query(
            "INSERT INTO rules (id, event_entity_type, event_id, trigger_name, active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&rule.event.entity_type)
        .bind(&rule.event.id)
        .bind(&rule.trigger)
        .bind(i32::from(rule.active))
        .bind(rule.created_at.to_rfc3339())
        .bind(rule.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Rule>> {
        let row: Option<RuleRow> = sqlx::query_as("SELECT * FROM rules WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_rule).transpose()
    }

    async fn update(&self, rule: &Rule) -> DomainResult<()> {
        let id = rule
            .id
            .ok_or_else(|| DomainError::ValidationFailed("cannot update an unsaved rule".to_string()))?;

        let result = sqlx::query(
            "UPDATE rules SET event_entity_type = ?, event_id = ?, trigger_name = ?, active = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&rule.event.entity_type)
        .bind(&rule.event.id)
        .bind(&rule.trigger)
        .bind(i32::from(rule.active))
        .bind(rule.updated_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::RuleNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        sqlx::query("DELETE FROM rules WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, filter: &RuleFilter) -> DomainResult<Vec<Rule>> {
        let (clause, bindings) = filter_clause(filter);
        let sql = format!("SELECT * FROM rules{clause} ORDER BY created_at, id");

        let mut q = sqlx::query_as::<_, RuleRow>(&sql);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_rule).collect()
    }

    async fn count(&self, filter: &RuleFilter) -> DomainResult<u64> {
        let (clause, bindings) = filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM rules{clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&sql);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let count = q.fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
