use std::sync::Arc;

use crate::config::QueryCatalog;
use crate::models::{SessionInfo, TableInfo};
use crate::services::connection::{
    ConnectionProvider, QueryResult, cell_as_f64, cell_as_i64, cell_as_string, release,
};
use crate::utils::{ApiError, ApiResult};

/// Read-only listings of sessions and tables on the monitored server
pub struct InventoryService {
    provider: Arc<dyn ConnectionProvider>,
    queries: QueryCatalog,
}

impl InventoryService {
    pub fn new(provider: Arc<dyn ConnectionProvider>, queries: QueryCatalog) -> Self {
        Self { provider, queries }
    }

    /// Running connections, ordered by connection id. Every row is kept; an id
    /// the driver cannot read as an integer comes back as null.
    pub async fn sessions(&self) -> ApiResult<Vec<SessionInfo>> {
        let result = self.run(&self.queries.sessions, "sessions").await?;

        let sessions = result
            .rows
            .iter()
            .map(|row| SessionInfo {
                connection_id: row.first().and_then(cell_as_i64),
                client_host: row.get(1).and_then(cell_as_string),
                client_ip: row.get(2).and_then(cell_as_string),
                status: row.get(3).and_then(cell_as_string),
            })
            .collect();

        Ok(sessions)
    }

    /// The 100 largest column tables by memory footprint
    pub async fn tables(&self) -> ApiResult<Vec<TableInfo>> {
        let result = self.run(&self.queries.tables, "tables").await?;

        let tables = result
            .rows
            .iter()
            .take(100)
            .map(|row| TableInfo {
                schema: row.first().and_then(cell_as_string).unwrap_or_default(),
                table: row.get(1).and_then(cell_as_string).unwrap_or_default(),
                record_count: row.get(2).and_then(cell_as_i64),
                memory_mb: row.get(3).and_then(cell_as_f64),
            })
            .collect();

        Ok(tables)
    }

    async fn run(&self, sql: &str, what: &str) -> ApiResult<QueryResult> {
        let mut conn = self.provider.acquire().await?;
        let result = conn.query(sql).await;
        release(conn).await;

        result.map_err(|e| {
            tracing::error!("Failed to fetch {}: {}", what, e);
            ApiError::query_failed(format!("Failed to fetch {}: {}", what, e))
        })
    }
}
