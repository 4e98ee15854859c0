//! KPI Collector
//!
//! Fetches CPU, memory and active-session figures over one connection. Each
//! metric is fetched in isolation: a failing query turns that metric into a
//! sentinel and the remaining metrics are still attempted.

use std::sync::Arc;

use crate::config::QueryCatalog;
use crate::models::{KpiSample, MemoryUsage, MetricValue};
use crate::services::connection::{
    ConnectionProvider, DbConnection, cell_as_f64, cell_as_i64, cell_as_string,
};
use crate::utils::error::{CpuParseError, MetricFetchError, QueryError};

pub const CONNECTION_FAILED_MESSAGE: &str =
    "Database connection failed. Please check the connection settings and network.";

pub struct KpiCollector {
    provider: Arc<dyn ConnectionProvider>,
    queries: QueryCatalog,
}

impl KpiCollector {
    pub fn new(provider: Arc<dyn ConnectionProvider>, queries: QueryCatalog) -> Self {
        Self { provider, queries }
    }

    /// Open a connection, collect one sample and release the connection.
    pub async fn fetch(&self) -> KpiSample {
        let mut conn = match self.provider.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("KPI collection could not connect: {}", e);
                return KpiSample::connection_failed(CONNECTION_FAILED_MESSAGE);
            },
        };

        let mut sample = self.collect(conn.as_mut()).await;

        if let Err(e) = conn.close().await {
            tracing::error!("KPI collection failed at transaction end: {}", e);
            sample.collection_error = Some(format!("A critical SQL error occurred: {}", e));
        }

        sample
    }

    /// Collect every metric over `conn`. All three are attempted before returning.
    pub async fn collect(&self, conn: &mut dyn DbConnection) -> KpiSample {
        let cpu_usage_percent = match self.fetch_cpu(conn).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("ERROR fetching CPU: {}", e);
                MetricValue::Error
            },
        };

        let memory_usage = match self.fetch_memory(conn).await {
            Ok(memory) => memory,
            Err(e) => {
                tracing::warn!("ERROR fetching Memory: {}", e);
                MemoryUsage::error()
            },
        };

        let active_sessions = match self.fetch_active_sessions(conn).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("ERROR fetching Sessions: {}", e);
                MetricValue::Error
            },
        };

        KpiSample { cpu_usage_percent, memory_usage, active_sessions, collection_error: None }
    }

    async fn fetch_cpu(
        &self,
        conn: &mut dyn DbConnection,
    ) -> Result<MetricValue<f64>, MetricFetchError> {
        let result = conn.query(&self.queries.cpu).await?;
        match result.first_cell().and_then(cell_as_string) {
            Some(overview) => Ok(MetricValue::Value(parse_cpu_usage(&overview)?)),
            None => Ok(MetricValue::Unavailable),
        }
    }

    async fn fetch_memory(&self, conn: &mut dyn DbConnection) -> Result<MemoryUsage, MetricFetchError> {
        let result = conn.query(&self.queries.memory).await?;
        let Some(row) = result.rows.first() else {
            return Ok(MemoryUsage::unavailable());
        };

        let used = match row.first() {
            Some(used) if !used.is_null() => used,
            _ => return Ok(MemoryUsage::unavailable()),
        };
        let used = cell_as_f64(used)
            .ok_or_else(|| QueryError::new(format!("memory used is not numeric: {}", used)))?;

        let total = match row.get(1).filter(|v| !v.is_null()) {
            Some(total) => match cell_as_f64(total) {
                Some(total) => MetricValue::Value(total),
                None => {
                    return Err(QueryError::new(format!("memory total is not numeric: {}", total))
                        .into());
                },
            },
            None => MetricValue::Unavailable,
        };

        Ok(MemoryUsage { used: MetricValue::Value(used), total })
    }

    async fn fetch_active_sessions(
        &self,
        conn: &mut dyn DbConnection,
    ) -> Result<MetricValue<i64>, MetricFetchError> {
        let result = conn.query(&self.queries.active_sessions).await?;
        match result.first_cell().filter(|v| !v.is_null()) {
            Some(cell) => cell_as_i64(cell).map(MetricValue::Value).ok_or_else(|| {
                QueryError::new(format!("session count is not numeric: {}", cell)).into()
            }),
            None => Ok(MetricValue::Unavailable),
        }
    }
}

/// Parse `"Available <A>, Used <U>"` into a usage percentage rounded to 2 decimals.
///
/// Each number is the last whitespace separated token of its segment. A
/// non-positive `A` yields 0.
pub fn parse_cpu_usage(overview: &str) -> Result<f64, CpuParseError> {
    let mut segments = overview.split(',');
    let available_segment = segments.next().unwrap_or_default();
    let used_segment =
        segments.next().ok_or_else(|| CpuParseError::MissingSegment(overview.to_string()))?;

    let available = last_number(available_segment)?;
    let used = last_number(used_segment)?;

    if available > 0.0 {
        Ok(round2(used / available * 100.0))
    } else {
        Ok(0.0)
    }
}

fn last_number(segment: &str) -> Result<f64, CpuParseError> {
    segment
        .split_whitespace()
        .next_back()
        .and_then(|token| token.parse::<f64>().ok())
        .ok_or_else(|| CpuParseError::NotANumber(segment.trim().to_string()))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
