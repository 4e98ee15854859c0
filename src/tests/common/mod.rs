// Common test utilities and helpers

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::QueryCatalog;
use crate::services::connection::{ConnectionProvider, DbConnection, QueryResult};
use crate::utils::error::{ConnectionError, QueryError};

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::migrate!().run(&pool).await.expect("Failed to run migrations");

    pool
}

/// Canned answer for one statement
#[derive(Debug, Clone)]
pub enum Scripted {
    Rows(QueryResult),
    Affected(u64),
    Fail(String),
}

impl Scripted {
    pub fn rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Scripted::Rows(QueryResult::new(columns.iter().map(|c| c.to_string()).collect(), rows))
    }

    pub fn single(value: Value) -> Self {
        Scripted::rows(&["VALUE"], vec![vec![value]])
    }

    pub fn empty() -> Self {
        Scripted::rows(&[], Vec::new())
    }

    pub fn fail(msg: &str) -> Self {
        Scripted::Fail(msg.to_string())
    }
}

/// Everything the fake database observed
#[derive(Debug, Default)]
pub struct DbLog {
    pub opened: usize,
    pub closed: usize,
    pub commits: usize,
    pub statements: Vec<String>,
}

/// Connection provider answering from a statement -> response table
pub struct ScriptedProvider {
    responses: Arc<HashMap<String, Scripted>>,
    log: Arc<Mutex<DbLog>>,
    connect_error: Option<String>,
    fail_close: bool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(HashMap::new()),
            log: Arc::new(Mutex::new(DbLog::default())),
            connect_error: None,
            fail_close: false,
        }
    }

    pub fn unreachable(msg: &str) -> Self {
        Self { connect_error: Some(msg.to_string()), ..Self::new() }
    }

    pub fn on(mut self, sql: &str, response: Scripted) -> Self {
        Arc::make_mut(&mut self.responses).insert(sql.to_string(), response);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn log(&self) -> Arc<Mutex<DbLog>> {
        Arc::clone(&self.log)
    }

    pub fn into_dyn(self) -> (Arc<dyn ConnectionProvider>, Arc<Mutex<DbLog>>) {
        let log = self.log();
        (Arc::new(self), log)
    }
}

#[async_trait]
impl ConnectionProvider for ScriptedProvider {
    async fn acquire(&self) -> Result<Box<dyn DbConnection>, ConnectionError> {
        if let Some(msg) = &self.connect_error {
            return Err(ConnectionError::Driver(msg.clone()));
        }
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(ScriptedConnection {
            responses: Arc::clone(&self.responses),
            log: Arc::clone(&self.log),
            fail_close: self.fail_close,
        }))
    }
}

struct ScriptedConnection {
    responses: Arc<HashMap<String, Scripted>>,
    log: Arc<Mutex<DbLog>>,
    fail_close: bool,
}

impl ScriptedConnection {
    fn answer(&self, sql: &str) -> Scripted {
        self.log.lock().unwrap().statements.push(sql.to_string());
        self.responses
            .get(sql)
            .cloned()
            .unwrap_or_else(|| Scripted::Fail(format!("unexpected statement: {}", sql)))
    }
}

#[async_trait]
impl DbConnection for ScriptedConnection {
    async fn query(&mut self, sql: &str) -> Result<QueryResult, QueryError> {
        match self.answer(sql) {
            Scripted::Rows(result) => Ok(result),
            Scripted::Affected(_) => Ok(QueryResult::default()),
            Scripted::Fail(msg) => Err(QueryError(msg)),
        }
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, QueryError> {
        match self.answer(sql) {
            Scripted::Rows(result) => Ok(result.rows.len() as u64),
            Scripted::Affected(n) => Ok(n),
            Scripted::Fail(msg) => Err(QueryError(msg)),
        }
    }

    async fn commit(&mut self) -> Result<(), QueryError> {
        self.log.lock().unwrap().commits += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), QueryError> {
        self.log.lock().unwrap().closed += 1;
        if self.fail_close {
            return Err(QueryError::new("transaction rolled back"));
        }
        Ok(())
    }
}

/// Catalog with short statement names so tests read easily
pub fn test_queries() -> QueryCatalog {
    QueryCatalog {
        cpu: "CPU".to_string(),
        memory: "MEMORY".to_string(),
        active_sessions: "ACTIVE_SESSIONS".to_string(),
        sessions: "SESSIONS".to_string(),
        tables: "TABLES".to_string(),
        health_checks: vec![
            crate::models::HealthCheckDefinition {
                name: "Last Successful Data Backup".to_string(),
                query: "BACKUP".to_string(),
            },
            crate::models::HealthCheckDefinition {
                name: "Active Transactions".to_string(),
                query: "TRANSACTIONS".to_string(),
            },
        ],
    }
}

/// Provider answering all three KPI statements successfully
pub fn healthy_kpis() -> ScriptedProvider {
    ScriptedProvider::new()
        .on("CPU", Scripted::single(Value::from("Available 400, Used 170")))
        .on("MEMORY", Scripted::rows(&["USED", "TOTAL"], vec![vec![Value::from("3.10"), Value::from("16.00")]]))
        .on("ACTIVE_SESSIONS", Scripted::single(Value::from(7)))
}
