//! SQLite adapter for RuleTemplateRepository.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::adapters::sqlite::{parse_datetime, parse_json_or_default};
use crate::domain::errors::DomainResult;
use crate::domain::models::RuleTemplate;
use crate::domain::ports::RuleTemplateRepository;

#[derive(Clone)]
pub struct SqliteRuleTemplateRepository {
    pool: SqlitePool,
}

impl SqliteRuleTemplateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RuleTemplateRow {
    #[allow(dead_code)]
    id: String,
    entity_type: String,
    bundle: String,
    trigger_name: String,
    machine_name: String,
    conditions: Option<String>,
    actions: Option<String>,
    created_at: String,
    updated_at: String,
}

fn row_to_template(row: RuleTemplateRow) -> DomainResult<RuleTemplate> {
    let conditions: IndexMap<String, Value> = parse_json_or_default(row.conditions)?;
    let actions: IndexMap<String, Value> = parse_json_or_default(row.actions)?;

    Ok(RuleTemplate {
        entity_type: row.entity_type,
        bundle: row.bundle,
        trigger: row.trigger_name,
        machine_name: row.machine_name,
        conditions,
        actions,
        created_at: parse_datetime(&row.created_at)?,
        updated_at: parse_datetime(&row.updated_at)?,
    })
}

#[async_trait]
impl RuleTemplateRepository for SqliteRuleTemplateRepository {
    async fn get(&self, id: &str) -> DomainResult<Option<RuleTemplate>> {
        let row: Option<RuleTemplateRow> = sqlx::query_as("SELECT * FROM rule_templates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_template).transpose()
    }

    async fn save(&self, template: &RuleTemplate) -> DomainResult<()> {
        let conditions = serde_json::to_string(&template.conditions)?;
        let actions = serde_json::to_string(&template.actions)?;

        sqlx::query(
            "INSERT INTO rule_templates
             (id, entity_type, bundle, trigger_name, machine_name, conditions, actions, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
               conditions = excluded.conditions,
               actions = excluded.actions,
               updated_at = excluded.updated_at",
        )
        .bind(template.id())
        .bind(&template.entity_type)
        .bind(&template.bundle)
        .bind(&template.trigger)
        .bind(&template.machine_name)
        .bind(&conditions)
        .bind(&actions)
        .bind(template.created_at.to_rfc3339())
        .bind(template.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        sqlx::query("DELETE FROM rule_templates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_matching(
        &self,
        entity_type: &str,
        bundle: &str,
        trigger: Option<&str>,
    ) -> DomainResult<Vec<RuleTemplate>> {
        let rows: Vec<RuleTemplateRow> = if let Some(trigger) = trigger {
            sqlx::query_as(
                "SELECT * FROM rule_templates
                 WHERE entity_type = ? AND bundle = ? AND trigger_name = ?
                 ORDER BY machine_name",
            )
            .bind(entity_type)
            .bind(bundle)
            .bind(trigger)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT * FROM rule_templates WHERE entity_type = ? AND bundle = ? ORDER BY trigger_name, machine_name",
            )
            .bind(entity_type)
            .bind(bundle)
            .fetch_all(&self.pool)
            .await?
        };

        rows.into_iter().map(row_to_template).collect()
    }

    async fn delete_for_event_type(&self, entity_type: &str, bundle: &str) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM rule_templates WHERE entity_type = ? AND bundle = ?")
            .bind(entity_type)
            .bind(bundle)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list(&self) -> DomainResult<Vec<RuleTemplate>> {
        let rows: Vec<RuleTemplateRow> =
            sqlx::query_as("SELECT * FROM rule_templates ORDER BY entity_type, bundle, trigger_name, machine_name")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(row_to_template).collect()
    }
}
