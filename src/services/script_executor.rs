//! Script Executor
//!
//! Runs one caller supplied statement verbatim. There is deliberately no
//! allow-list, size limit or parameter binding: this is an unrestricted
//! administrative capability and access to it must be controlled in front of
//! the HTTP layer.

use std::sync::Arc;

use crate::models::{ExecutionResult, StatementKind};
use crate::services::connection::{ConnectionProvider, DbConnection, release};
use crate::utils::error::QueryError;

/// Classify a statement by its leading keyword only.
///
/// Leading whitespace and case are ignored. No SQL is parsed, so a statement
/// starting with a comment is treated as mutating even if it selects.
pub fn classify_statement(statement: &str) -> StatementKind {
    let is_select = statement
        .trim_start()
        .as_bytes()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(b"SELECT"));

    if is_select { StatementKind::ReadStatement } else { StatementKind::MutatingStatement }
}

pub struct ScriptExecutor {
    provider: Arc<dyn ConnectionProvider>,
}

impl ScriptExecutor {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    pub async fn execute(&self, statement: &str) -> ExecutionResult {
        let mut conn = match self.provider.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Script execution could not connect: {}", e);
                return ExecutionResult::ConnectionFailed {
                    error: format!("Database connection failed: {}", e),
                };
            },
        };

        let kind = classify_statement(statement);
        // Statements may carry credentials; the text stays at debug
        tracing::info!("Executing {}", describe_statement(kind, statement));
        tracing::debug!("Statement text: {}", statement);

        let result = match run_statement(conn.as_mut(), statement, kind).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Script execution failed: {}", e);
                ExecutionResult::Failed { error: format!("Execution failed: {}", e) }
            },
        };

        release(conn).await;
        result
    }
}

fn describe_statement(kind: StatementKind, statement: &str) -> String {
    format!("{:?} ({} chars)", kind, statement.chars().count())
}

async fn run_statement(
    conn: &mut dyn DbConnection,
    statement: &str,
    kind: StatementKind,
) -> Result<ExecutionResult, QueryError> {
    match kind {
        StatementKind::ReadStatement => {
            let result = conn.query(statement).await?;
            let columns = result.columns.clone();
            Ok(ExecutionResult::Rows { columns, rows: result.into_records() })
        },
        StatementKind::MutatingStatement => {
            let rows_affected = conn.execute(statement).await?;
            conn.commit().await?;
            Ok(ExecutionResult::Affected { rows_affected })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_read() {
        assert_eq!(classify_statement("SELECT 1 FROM DUMMY"), StatementKind::ReadStatement);
        assert_eq!(classify_statement("  select 1 from dummy"), StatementKind::ReadStatement);
        assert_eq!(classify_statement("\n\tSeLeCt *"), StatementKind::ReadStatement);
    }

    #[test]
    fn test_everything_else_is_mutating() {
        assert_eq!(classify_statement("UPDATE T SET X=1"), StatementKind::MutatingStatement);
        assert_eq!(classify_statement(""), StatementKind::MutatingStatement);
        assert_eq!(classify_statement("SELEC"), StatementKind::MutatingStatement);
        assert_eq!(classify_statement("WITH x AS (SELECT 1) SELECT * FROM x"), StatementKind::MutatingStatement);
    }

    #[test]
    fn test_leading_comment_defeats_token_sniffing() {
        assert_eq!(
            classify_statement("-- report\nSELECT 1 FROM DUMMY"),
            StatementKind::MutatingStatement
        );
        assert_eq!(classify_statement("/* x */ SELECT 1"), StatementKind::MutatingStatement);
    }

    #[test]
    fn test_description_omits_statement_text() {
        let statement = "ALTER USER MONITOR PASSWORD Secret123";
        let described = describe_statement(classify_statement(statement), statement);

        assert_eq!(described, "MutatingStatement (37 chars)");
        assert!(!described.contains("Secret123"));
    }

    #[test]
    fn test_prefix_match_only() {
        // no word boundary check
        assert_eq!(classify_statement("SELECTED_ROWS"), StatementKind::ReadStatement);
    }
}
