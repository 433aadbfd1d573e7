//! SQLite adapter for ComponentRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ComponentRecord, ComponentType};
use crate::domain::ports::ComponentRepository;

#[derive(Clone)]
pub struct SqliteComponentRepository {
    pool: SqlitePool,
}

impl SqliteComponentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ComponentRow {
    id: String,
    rule_id: String,
    component_type: String,
    plugin_id: String,
    configuration: String,
    created_at: String,
    updated_at: String,
}

fn row_to_component(row: ComponentRow) -> DomainResult<ComponentRecord> {
    let component_type: ComponentType = row.component_type.parse()?;
    let configuration = serde_json::from_str(&row.configuration)
        .map_err(|e| DomainError::SerializationError(format!("configuration: {e}")))?;

    Ok(ComponentRecord::restore(
        parse_uuid(&row.id)?,
        parse_uuid(&row.rule_id)?,
        component_type,
        row.plugin_id,
        configuration,
        parse_datetime(&row.created_at)?,
        parse_datetime(&row.updated_at)?,
    ))
}

const COLUMNS: &str = "id, rule_id, component_type, plugin_id, configuration, created_at, updated_at";

#[async_trait]
impl ComponentRepository for SqliteComponentRepository {
    async fn create(&self, component: &ComponentRecord) -> DomainResult<()> {
        let (Some(id), Some(rule_id)) = (component.id, component.rule_id) else {
            return Err(DomainError::ValidationFailed(
                "component id and rule id must be assigned before insert".to_string(),
            ));
        };
        let configuration = serde_json::to_string(&component.configuration)?;

        sqlx::query(
            "INSERT INTO rule_components
             (id, rule_id, component_type, plugin_id, configuration, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5,
                     (SELECT COALESCE(MAX(position), -1) + 1 FROM rule_components WHERE rule_id = ?2),
                     ?6, ?7)",
        )
        .bind(id.to_string())
        .bind(rule_id.to_string())
        .bind(component.component_type().as_str())
        .bind(&component.plugin_id)
        .bind(&configuration)
        .bind(component.created_at.to_rfc3339())
        .bind(component.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<ComponentRecord>> {
        let row: Option<ComponentRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM rule_components WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(row_to_component).transpose()
    }

    async fn update(&self, component: &ComponentRecord) -> DomainResult<()> {
        let id = component
            .id
            .ok_or_else(|| DomainError::ValidationFailed("cannot update an unsaved component".to_string()))?;
        let configuration = serde_json::to_string(&component.configuration)?;

        let result = sqlx::query(
            "UPDATE rule_components SET plugin_id = ?, configuration = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&component.plugin_id)
        .bind(&configuration)
        .bind(component.updated_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ComponentNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        sqlx::query("DELETE FROM rule_components WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_for_rule(&self, rule_id: Uuid) -> DomainResult<Vec<ComponentRecord>> {
        let rows: Vec<ComponentRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM rule_components WHERE rule_id = ? ORDER BY position, created_at"
        ))
        .bind(rule_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_component).collect()
    }
}
