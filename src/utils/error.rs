use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a usable connection to the monitored database.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    #[error("invalid connection settings: {0}")]
    Config(String),
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Driver(String),
}

/// A statement raised on the database side.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct QueryError(pub String);

impl QueryError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// The CPU overview string did not have the `Available <A>, Used <U>` shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CpuParseError {
    #[error("expected two comma separated segments in '{0}'")]
    MissingSegment(String),
    #[error("segment '{0}' does not end with a number")]
    NotANumber(String),
}

/// Failure confined to a single KPI; downgraded to a sentinel by the collector.
#[derive(Debug, Error)]
pub enum MetricFetchError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Parse(#[from] CpuParseError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    ConnectionFailed(String),
    #[error("{0}")]
    QueryFailed(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn query_failed(msg: impl Into<String>) -> Self {
        Self::QueryFailed(msg.into())
    }

    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ConnectionFailed(_) | ApiError::QueryFailed(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl From<ConnectionError> for ApiError {
    fn from(err: ConnectionError) -> Self {
        ApiError::connection_failed(format!("Database connection failed: {}", err))
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::query_failed(format!("Query failed: {}", err))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("History store error: {}", err);
        ApiError::internal_error(format!("History store error: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_map_to_server_error() {
        let err: ApiError = ConnectionError::Config("database address is not configured".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("database address is not configured"));
    }

    #[test]
    fn validation_errors_are_client_errors() {
        assert_eq!(ApiError::validation_error("bad").status_code(), StatusCode::BAD_REQUEST);
    }
}
