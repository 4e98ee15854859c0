use async_trait::async_trait;
use mysql_async::{Conn, OptsBuilder, Row, SslOpts, prelude::Queryable};
use serde_json::Value;

use crate::config::TargetConfig;
use crate::services::connection::{
    ConnectionProvider, DbConnection, QueryResult, TlsMode, connect_with_timeout, target_endpoint,
};
use crate::utils::error::{ConnectionError, QueryError};

/// Opens one dedicated `mysql_async` connection per operation.
///
/// For MySQL-compatible targets; the default statement catalog is HANA SQL,
/// so `[queries]` has to be overridden alongside `driver = "mysql"`.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    target: TargetConfig,
}

impl MySqlConnector {
    pub fn new(target: TargetConfig) -> Self {
        Self { target }
    }

    fn build_opts(&self) -> Result<OptsBuilder, ConnectionError> {
        let (address, port) = target_endpoint(&self.target)?;

        let ssl_opts = match TlsMode::for_target(&self.target) {
            TlsMode::Disabled => None,
            TlsMode::Verified => Some(SslOpts::default()),
            TlsMode::Unverified => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
        };

        Ok(OptsBuilder::default()
            .ip_or_hostname(address)
            .tcp_port(port)
            .user(Some(&self.target.user))
            .pass(Some(&self.target.password))
            .db_name(None::<String>)
            .prefer_socket(false)
            .ssl_opts(ssl_opts)
            .tcp_nodelay(true))
    }
}

#[async_trait]
impl ConnectionProvider for MySqlConnector {
    async fn acquire(&self) -> Result<Box<dyn DbConnection>, ConnectionError> {
        let opts = self.build_opts()?;
        let conn = connect_with_timeout(&self.target, Conn::new(opts)).await?;

        Ok(Box::new(MySqlConnection { conn: Some(conn) }))
    }
}

pub struct MySqlConnection {
    conn: Option<Conn>,
}

impl MySqlConnection {
    fn conn_mut(&mut self) -> Result<&mut Conn, QueryError> {
        self.conn.as_mut().ok_or_else(|| QueryError::new("connection already closed"))
    }
}

impl From<mysql_async::Error> for QueryError {
    fn from(err: mysql_async::Error) -> Self {
        QueryError(err.to_string())
    }
}

#[async_trait]
impl DbConnection for MySqlConnection {
    async fn query(&mut self, sql: &str) -> Result<QueryResult, QueryError> {
        let conn = self.conn_mut()?;
        let mut result = conn.query_iter(sql).await?;

        let columns = result
            .columns()
            .map(|cols| cols.iter().map(|c| c.name_str().to_string()).collect())
            .unwrap_or_default();
        let rows: Vec<Row> = result.collect().await?;

        tracing::debug!("SQL: '{}' -> {} rows", sql, rows.len());

        Ok(QueryResult::new(columns, rows.iter().map(row_to_cells).collect()))
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, QueryError> {
        let conn = self.conn_mut()?;
        let result = conn.query_iter(sql).await?;
        let affected = result.affected_rows();
        result.drop_result().await?;
        Ok(affected)
    }

    async fn commit(&mut self) -> Result<(), QueryError> {
        self.conn_mut()?.query_drop("COMMIT").await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), QueryError> {
        match self.conn.take() {
            Some(conn) => conn.disconnect().await.map_err(QueryError::from),
            None => Ok(()),
        }
    }
}

fn row_to_cells(row: &Row) -> Vec<Value> {
    (0..row.len())
        .map(|idx| row.as_ref(idx).map(value_to_json).unwrap_or(Value::Null))
        .collect()
}

fn value_to_json(value: &mysql_async::Value) -> Value {
    match value {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        },
        mysql_async::Value::Int(i) => Value::from(*i),
        mysql_async::Value::UInt(u) => Value::from(*u),
        mysql_async::Value::Float(f) => Value::from(*f as f64),
        mysql_async::Value::Double(d) => Value::from(*d),
        mysql_async::Value::Date(year, month, day, hour, minute, second, _micro) => {
            Value::String(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ))
        },
        mysql_async::Value::Time(neg, days, hours, minutes, seconds, _micro) => {
            let total_hours = days * 24 + (*hours as u32);
            let sign = if *neg { "-" } else { "" };
            Value::String(format!("{}{}:{:02}:{:02}", sign, total_hours, minutes, seconds))
        },
    }
}
