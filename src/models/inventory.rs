use serde::Serialize;
use utoipa::ToSchema;

/// A running client connection on the monitored server
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub connection_id: Option<i64>,
    pub client_host: Option<String>,
    pub client_ip: Option<String>,
    pub status: Option<String>,
}

/// Column-store table footprint
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub schema: String,
    pub table: String,
    pub record_count: Option<i64>,
    pub memory_mb: Option<f64>,
}
