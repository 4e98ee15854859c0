use async_trait::async_trait;
use hdbconnect_async::{ConnectParams, Connection, HdbError, HdbValue, ServerCerts};
use serde_json::Value;

use crate::config::TargetConfig;
use crate::services::connection::{
    ConnectionProvider, DbConnection, QueryResult, TlsMode, connect_with_timeout, target_endpoint,
};
use crate::utils::error::{ConnectionError, QueryError};

/// Opens one dedicated `hdbconnect_async` connection per operation.
#[derive(Debug, Clone)]
pub struct HanaConnector {
    target: TargetConfig,
}

impl HanaConnector {
    pub fn new(target: TargetConfig) -> Self {
        Self { target }
    }

    fn connect_params(&self) -> Result<ConnectParams, ConnectionError> {
        let (address, port) = target_endpoint(&self.target)?;

        let mut builder = ConnectParams::builder();
        builder
            .hostname(address)
            .port(port)
            .dbuser(&self.target.user)
            .password(&self.target.password);

        match TlsMode::for_target(&self.target) {
            TlsMode::Disabled => {},
            TlsMode::Verified => {
                builder.tls_with(ServerCerts::RootCertificates);
            },
            TlsMode::Unverified => {
                builder.tls_without_server_verification();
            },
        }

        builder.build().map_err(|e| ConnectionError::Config(e.to_string()))
    }
}

#[async_trait]
impl ConnectionProvider for HanaConnector {
    async fn acquire(&self) -> Result<Box<dyn DbConnection>, ConnectionError> {
        let params = self.connect_params()?;
        let conn = connect_with_timeout(&self.target, Connection::new(params)).await?;

        Ok(Box::new(HanaConnection { conn: Some(conn) }))
    }
}

pub struct HanaConnection {
    conn: Option<Connection>,
}

impl HanaConnection {
    fn conn(&self) -> Result<&Connection, QueryError> {
        self.conn.as_ref().ok_or_else(|| QueryError::new("connection already closed"))
    }
}

impl From<HdbError> for QueryError {
    fn from(err: HdbError) -> Self {
        QueryError(err.to_string())
    }
}

#[async_trait]
impl DbConnection for HanaConnection {
    async fn query(&mut self, sql: &str) -> Result<QueryResult, QueryError> {
        let result_set = self.conn()?.query(sql).await?;

        let columns = result_set
            .metadata()
            .iter()
            .map(|field| field.displayname().to_string())
            .collect();
        let rows: Vec<Vec<Value>> = result_set
            .into_rows()
            .await?
            .map(|row| row.into_iter().map(hdb_to_json).collect())
            .collect();

        tracing::debug!("SQL: '{}' -> {} rows", sql, rows.len());

        Ok(QueryResult::new(columns, rows))
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, QueryError> {
        let affected = self.conn()?.dml(sql).await?;
        Ok(affected as u64)
    }

    async fn commit(&mut self) -> Result<(), QueryError> {
        self.conn()?.commit().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), QueryError> {
        // The session is disconnected when the handle drops
        self.conn.take();
        Ok(())
    }
}

/// Map a HANA cell to JSON. Decimals and temporal types keep the driver's
/// text form; the numeric accessors parse it.
fn hdb_to_json(value: HdbValue) -> Value {
    match value {
        HdbValue::NULL => Value::Null,
        HdbValue::TINYINT(v) => Value::from(v),
        HdbValue::SMALLINT(v) => Value::from(v),
        HdbValue::INT(v) => Value::from(v),
        HdbValue::BIGINT(v) => Value::from(v),
        HdbValue::REAL(v) => Value::from(f64::from(v)),
        HdbValue::DOUBLE(v) => Value::from(v),
        HdbValue::BOOLEAN(v) => Value::Bool(v),
        HdbValue::STRING(s) => Value::String(s),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_address_is_a_connection_error() {
        let connector = HanaConnector::new(TargetConfig::default());
        match connector.acquire().await {
            Err(ConnectionError::Config(msg)) => assert!(msg.contains("address")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connection should not open without an address"),
        }
    }

    #[tokio::test]
    async fn test_zero_port_is_a_connection_error() {
        let target =
            TargetConfig { address: Some("hana01".into()), port: 0, ..TargetConfig::default() };
        let connector = HanaConnector::new(target);
        assert!(matches!(connector.acquire().await, Err(ConnectionError::Config(_))));
    }

    #[test]
    fn test_connect_params_accept_every_tls_mode() {
        for (encrypt, validate_certificate) in [(false, false), (true, true), (true, false)] {
            let target = TargetConfig {
                address: Some("hana01".into()),
                user: "MONITOR".into(),
                password: "secret".into(),
                encrypt,
                validate_certificate,
                ..TargetConfig::default()
            };
            assert!(HanaConnector::new(target).connect_params().is_ok());
        }
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(hdb_to_json(HdbValue::NULL), Value::Null);
        assert_eq!(hdb_to_json(HdbValue::INT(7)), Value::from(7));
        assert_eq!(hdb_to_json(HdbValue::BIGINT(200301)), Value::from(200301));
        assert_eq!(hdb_to_json(HdbValue::DOUBLE(42.5)), Value::from(42.5));
        assert_eq!(hdb_to_json(HdbValue::BOOLEAN(true)), Value::Bool(true));
        assert_eq!(
            hdb_to_json(HdbValue::STRING("Available 400, Used 170".into())),
            Value::from("Available 400, Used 170")
        );
    }
}
