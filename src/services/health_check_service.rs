use serde_json::Value;
use std::sync::Arc;

use crate::models::{CheckStatus, HealthCheckDefinition, HealthCheckResult};
use crate::services::connection::{ConnectionProvider, release};

/// Runs the configured diagnostic queries over one connection.
///
/// A check that returns rows is a warning, one that returns nothing is OK and
/// one that raises is an error. A failing check never stops the ones after it.
pub struct HealthCheckService {
    provider: Arc<dyn ConnectionProvider>,
    checks: Vec<HealthCheckDefinition>,
}

impl HealthCheckService {
    pub fn new(provider: Arc<dyn ConnectionProvider>, checks: Vec<HealthCheckDefinition>) -> Self {
        Self { provider, checks }
    }

    pub async fn run_checks(&self) -> Vec<HealthCheckResult> {
        let mut conn = match self.provider.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Health check could not connect: {}", e);
                return vec![HealthCheckResult::new(
                    "Connection",
                    CheckStatus::Error,
                    format!("Could not connect to the database: {}", e),
                )];
            },
        };

        let mut report = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let result = match conn.query(&check.query).await {
                Ok(result) if result.rows.is_empty() => {
                    HealthCheckResult::new(&check.name, CheckStatus::Ok, "No issues found.")
                },
                Ok(result) => HealthCheckResult::new(
                    &check.name,
                    CheckStatus::Warning,
                    format!(
                        "{} issue(s) found. First row: {}",
                        result.rows.len(),
                        format_row(&result.rows[0])
                    ),
                ),
                Err(e) => {
                    tracing::warn!("Health check '{}' failed: {}", check.name, e);
                    HealthCheckResult::new(
                        &check.name,
                        CheckStatus::Error,
                        format!("Query failed: {}", e),
                    )
                },
            };
            report.push(result);
        }

        release(conn).await;
        report
    }
}

fn format_row(row: &[Value]) -> String {
    let cells: Vec<String> = row
        .iter()
        .map(|cell| match cell {
            Value::String(s) => s.clone(),
            Value::Null => "NULL".to_string(),
            other => other.to_string(),
        })
        .collect();
    format!("({})", cells.join(", "))
}
