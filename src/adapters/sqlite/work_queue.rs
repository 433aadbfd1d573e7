//! SQLite-backed work queue.
//!
//! Items are appended to `queue_items` and read in insertion order by the
//! worker loop. A consumer peeks the oldest item and acknowledges it once
//! handled, so an item whose processing failed is delivered again.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ScheduledRulePayload;
use crate::domain::ports::WorkQueue;

/// A queued payload with its row id, used to acknowledge it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueItem {
    pub id: i64,
    pub payload: ScheduledRulePayload,
}

#[derive(Clone)]
pub struct SqliteWorkQueue {
    pool: SqlitePool,
}

impl SqliteWorkQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The oldest item of a queue, left in place until [`ack`](Self::ack).
    ///
    /// An item that cannot be decoded is dropped and reported as an error.
    pub async fn peek(&self, queue_name: &str) -> DomainResult<Option<QueueItem>> {
        let row: Option<(i64, String)> = sqlx::query_as(
            "SELECT id, payload FROM queue_items WHERE queue_name = ? ORDER BY id LIMIT 1",
        )
        .bind(queue_name)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, payload)) = row else {
            return Ok(None);
        };

        match serde_json::from_str(&payload) {
            Ok(payload) => Ok(Some(QueueItem { id, payload })),
            Err(e) => {
                tracing::warn!(
                    item_id = id,
                    queue = %queue_name,
                    error = %e,
                    "Dropping malformed queue item"
                );
                self.ack(id).await?;
                Err(DomainError::SerializationError(format!("queue item {id}: {e}")))
            }
        }
    }

    /// Remove a handled item.
    pub async fn ack(&self, id: i64) -> DomainResult<()> {
        sqlx::query("DELETE FROM queue_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn pending_count(&self, queue_name: &str) -> DomainResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_items WHERE queue_name = ?")
            .bind(queue_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[async_trait]
impl WorkQueue for SqliteWorkQueue {
    async fn enqueue(&self, queue_name: &str, payload: &ScheduledRulePayload) -> DomainResult<()> {
        let payload = serde_json::to_string(payload)?;
        sqlx::query("INSERT INTO queue_items (queue_name, payload, created_at) VALUES (?, ?, ?)")
            .bind(queue_name)
            .bind(&payload)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::QueueError(e.to_string()))?;
        Ok(())
    }
}
