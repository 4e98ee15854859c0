// History Store
// Append-only KPI time series in the local SQLite database

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::HistoricalRecord;
use crate::utils::ApiResult;

/// Persisted KPI history.
///
/// Only the background sampler appends; any number of handlers read. SQLite
/// serializes the writes, so no extra locking is done here.
#[derive(Clone)]
pub struct HistoryStore {
    db: SqlitePool,
}

impl HistoryStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append one record stamped with the current time; returns its id.
    pub async fn append(&self, cpu_usage: f64, memory_usage: f64) -> ApiResult<i64> {
        let recorded_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO kpi_history (recorded_at, cpu_usage, memory_usage)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(recorded_at)
        .bind(cpu_usage)
        .bind(memory_usage)
        .execute(&self.db)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Records stamped at or after `since`, oldest first.
    pub async fn since(&self, since: DateTime<Utc>) -> ApiResult<Vec<HistoricalRecord>> {
        let records = sqlx::query_as::<_, HistoricalRecord>(
            r#"
            SELECT id, recorded_at, cpu_usage, memory_usage
            FROM kpi_history
            WHERE recorded_at >= ?
            ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }

    /// Records within the trailing `window`.
    pub async fn window(&self, window: chrono::Duration) -> ApiResult<Vec<HistoricalRecord>> {
        self.since(Utc::now() - window).await
    }
}
