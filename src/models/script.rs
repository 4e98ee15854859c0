use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScriptRequest {
    /// Statement executed verbatim against the monitored database
    pub script: String,
}

/// Shape of a statement as decided by its leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    ReadStatement,
    MutatingStatement,
}

/// Outcome of running one caller supplied statement
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Rows { columns: Vec<String>, rows: Vec<serde_json::Map<String, serde_json::Value>> },
    Affected { rows_affected: u64 },
    Failed { error: String },
    ConnectionFailed { error: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Rows { .. } | ExecutionResult::Affected { .. })
    }
}

/// Wire form of [`ExecutionResult`]
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScriptResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub rows: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ExecutionResult> for ScriptResponse {
    fn from(result: ExecutionResult) -> Self {
        let empty =
            ScriptResponse { success: false, columns: None, rows: None, message: None, error: None };
        match result {
            ExecutionResult::Rows { columns, rows } => {
                ScriptResponse { success: true, columns: Some(columns), rows: Some(rows), ..empty }
            },
            ExecutionResult::Affected { rows_affected } => ScriptResponse {
                success: true,
                message: Some(format!("{} rows affected.", rows_affected)),
                ..empty
            },
            ExecutionResult::Failed { error } | ExecutionResult::ConnectionFailed { error } => {
                ScriptResponse { error: Some(error), ..empty }
            },
        }
    }
}
