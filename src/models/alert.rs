use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Alert level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AlertEntry {
    pub level: AlertLevel,
    pub category: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertEntry {
    pub fn new(level: AlertLevel, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self { level, category: category.into(), message: message.into(), timestamp: Utc::now() }
    }
}
