//! Connection seam between the monitoring services and the database driver.
//!
//! Every operation opens its own connection through a [`ConnectionProvider`],
//! uses it from a single task and closes it before returning. Nothing is pooled.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{TargetConfig, TargetDriver};
use crate::services::{HanaConnector, MySqlConnector};
use crate::utils::error::{ConnectionError, QueryError};

/// Result set of a statement; cells are driver values mapped to JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// First cell of the first row, if any.
    pub fn first_cell(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Rows keyed by column name.
    pub fn into_records(self) -> Vec<serde_json::Map<String, Value>> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }
}

#[async_trait]
pub trait DbConnection: Send {
    /// Run a statement and fetch its column names and every row.
    async fn query(&mut self, sql: &str) -> Result<QueryResult, QueryError>;

    /// Run a statement and return the number of affected rows.
    async fn execute(&mut self, sql: &str) -> Result<u64, QueryError>;

    async fn commit(&mut self) -> Result<(), QueryError>;

    /// Release the connection. Must be the last call made on it.
    async fn close(&mut self) -> Result<(), QueryError>;
}

#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Open a fresh authenticated connection.
    async fn acquire(&self) -> Result<Box<dyn DbConnection>, ConnectionError>;
}

/// Provider for the configured wire protocol.
pub fn provider_for(target: &TargetConfig) -> Arc<dyn ConnectionProvider> {
    match target.driver {
        TargetDriver::Hana => Arc::new(HanaConnector::new(target.clone())),
        TargetDriver::Mysql => Arc::new(MySqlConnector::new(target.clone())),
    }
}

/// How the `encrypt` / `validate_certificate` pair maps onto the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    Disabled,
    Verified,
    /// Encrypted, but any server certificate is accepted
    Unverified,
}

impl TlsMode {
    pub fn for_target(target: &TargetConfig) -> Self {
        match (target.encrypt, target.validate_certificate) {
            (false, _) => TlsMode::Disabled,
            (true, true) => TlsMode::Verified,
            (true, false) => TlsMode::Unverified,
        }
    }
}

/// Host and port of the target, refused before any network traffic.
pub fn target_endpoint(target: &TargetConfig) -> Result<(&str, u16), ConnectionError> {
    let address = target
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ConnectionError::Config("database address is not configured".into()))?;

    if target.port == 0 {
        return Err(ConnectionError::Config("database port is not valid".into()));
    }

    Ok((address, target.port))
}

/// Drive a driver's connect future under the target's connect timeout.
pub async fn connect_with_timeout<T, E, F>(
    target: &TargetConfig,
    connect: F,
) -> Result<T, ConnectionError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let timeout = Duration::from_secs(target.connect_timeout_secs);

    tokio::time::timeout(timeout, connect)
        .await
        .map_err(|_| {
            tracing::error!("Connection to {:?} timed out", target.address);
            ConnectionError::Timeout(timeout)
        })?
        .map_err(|e| {
            tracing::error!("Failed to connect to {:?}: {}", target.address, e);
            ConnectionError::Driver(e.to_string())
        })
}

/// Close `conn`, logging instead of failing. Used on paths that already have a result.
pub async fn release(mut conn: Box<dyn DbConnection>) {
    if let Err(e) = conn.close().await {
        tracing::warn!("Failed to close database connection: {}", e);
    }
}

// Drivers speaking a text protocol hand numbers back as strings, so the
// accessors below accept both encodings.

pub fn cell_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn cell_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        },
        _ => None,
    }
}

pub fn cell_as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_cells_accept_text_encoding() {
        assert_eq!(cell_as_f64(&json!("3.25")), Some(3.25));
        assert_eq!(cell_as_f64(&json!(3.25)), Some(3.25));
        assert_eq!(cell_as_f64(&Value::Null), None);
        assert_eq!(cell_as_i64(&json!("17")), Some(17));
        assert_eq!(cell_as_i64(&json!(17)), Some(17));
        assert_eq!(cell_as_i64(&json!("abc")), None);
    }

    fn target(address: Option<&str>, port: u16) -> TargetConfig {
        TargetConfig { address: address.map(String::from), port, ..TargetConfig::default() }
    }

    #[test]
    fn test_tls_mode_follows_encrypt_and_validation() {
        let mut target = TargetConfig::default();
        assert_eq!(TlsMode::for_target(&target), TlsMode::Disabled);

        target.validate_certificate = true;
        assert_eq!(TlsMode::for_target(&target), TlsMode::Disabled);

        target.encrypt = true;
        assert_eq!(TlsMode::for_target(&target), TlsMode::Verified);

        target.validate_certificate = false;
        assert_eq!(TlsMode::for_target(&target), TlsMode::Unverified);
    }

    #[test]
    fn test_endpoint_requires_address_and_port() {
        assert!(matches!(target_endpoint(&target(None, 39015)), Err(ConnectionError::Config(_))));
        assert!(matches!(target_endpoint(&target(Some("  "), 39015)), Err(ConnectionError::Config(_))));
        assert!(matches!(target_endpoint(&target(Some("hana01"), 0)), Err(ConnectionError::Config(_))));
        assert_eq!(target_endpoint(&target(Some(" hana01 "), 30015)).unwrap(), ("hana01", 30015));
    }

    #[tokio::test]
    async fn test_connect_timeout_and_driver_errors() {
        let mut target = target(Some("hana01"), 39015);
        target.connect_timeout_secs = 0;
        let timed_out =
            connect_with_timeout(&target, std::future::pending::<Result<(), String>>()).await;
        assert!(matches!(timed_out, Err(ConnectionError::Timeout(_))));

        target.connect_timeout_secs = 5;
        let refused = connect_with_timeout(&target, async { Err::<(), _>("connection refused") }).await;
        match refused {
            Err(ConnectionError::Driver(msg)) => assert_eq!(msg, "connection refused"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_into_records_keys_by_column() {
        let result = QueryResult::new(
            vec!["A".into(), "B".into()],
            vec![vec![json!(1), json!("x")], vec![json!(2), Value::Null]],
        );
        let records = result.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["A"], json!(1));
        assert_eq!(records[1]["B"], Value::Null);
    }
}
