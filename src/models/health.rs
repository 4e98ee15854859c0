use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Classification of one diagnostic query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum CheckStatus {
    #[serde(rename = "OK")]
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HealthCheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: String,
}

impl HealthCheckResult {
    pub fn new(name: impl Into<String>, status: CheckStatus, details: impl Into<String>) -> Self {
        Self { name: name.into(), status, details: details.into() }
    }
}

/// A named diagnostic query; any returned row counts as an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckDefinition {
    pub name: String,
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&CheckStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(serde_json::to_string(&CheckStatus::Warning).unwrap(), "\"Warning\"");
        assert_eq!(serde_json::to_string(&CheckStatus::Error).unwrap(), "\"Error\"");
    }
}
