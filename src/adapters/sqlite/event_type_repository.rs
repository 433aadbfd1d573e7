//! SQLite adapter for EventTypeRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::adapters::sqlite::{parse_datetime, parse_json_or_default};
use crate::domain::errors::DomainResult;
use crate::domain::models::{EventType, IdentityTypeRef, IdentityTypeSettings};
use crate::domain::ports::EventTypeRepository;

#[derive(Clone)]
pub struct SqliteEventTypeRepository {
    pool: SqlitePool,
}

impl SqliteEventTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EventTypeRow {
    entity_type: String,
    bundle: String,
    identity_types: Option<String>,
    default_registrant_type: Option<String>,
    event_manage_operation: String,
    custom_rules: i32,
    created_at: String,
    updated_at: String,
}

fn row_to_event_type(row: EventTypeRow) -> DomainResult<EventType> {
    let identity_types: Vec<IdentityTypeSettings> = parse_json_or_default(row.identity_types)?;
    let default_registrant_type: Option<IdentityTypeRef> = parse_json_or_default(row.default_registrant_type)?;

    Ok(EventType {
        entity_type: row.entity_type,
        bundle: row.bundle,
        identity_types,
        default_registrant_type,
        event_manage_operation: row.event_manage_operation,
        custom_rules: row.custom_rules != 0,
        created_at: parse_datetime(&row.created_at)?,
        updated_at: parse_datetime(&row.updated_at)?,
    })
}

#[async_trait]
impl EventTypeRepository for SqliteEventTypeRepository {
    async fn get(&self, entity_type: &str, bundle: &str) -> DomainResult<Option<EventType>> {
        let row: Option<EventTypeRow> =
            sqlx::query_as("SELECT * FROM event_types WHERE entity_type = ? AND bundle = ?")
                .bind(entity_type)
                .bind(bundle)
                .fetch_optional(&self.pool)
                .await?;

        row.map(row_to_event_type).transpose()
    }

    async fn save(&self, event_type: &EventType) -> DomainResult<()> {
        let identity_types = serde_json::to_string(&event_type.identity_types)?;
        let default_registrant_type = event_type
            .default_registrant_type
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            "INSERT INTO event_types
             (entity_type, bundle, identity_types, default_registrant_type,
              event_manage_operation, custom_rules, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (entity_type, bundle) DO UPDATE SET
               identity_types = excluded.identity_types,
               default_registrant_type = excluded.default_registrant_type,
               event_manage_operation = excluded.event_manage_operation,
               custom_rules = excluded.custom_rules,
               updated_at = excluded.updated_at",
        )
        .bind(&event_type.entity_type)
        .bind(&event_type.bundle)
        .bind(&identity_types)
        .bind(&default_registrant_type)
        .bind(&event_type.event_manage_operation)
        .bind(i32::from(event_type.custom_rules))
        .bind(event_type.created_at.to_rfc3339())
        .bind(event_type.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, entity_type: &str, bundle: &str) -> DomainResult<()> {
        sqlx::query("DELETE FROM event_types WHERE entity_type = ? AND bundle = ?")
            .bind(entity_type)
            .bind(bundle)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<EventType>> {
        let rows: Vec<EventTypeRow> = sqlx::query_as("SELECT * FROM event_types ORDER BY entity_type, bundle")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_event_type).collect()
    }
}
