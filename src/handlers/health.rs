use axum::{Json, extract::State};
use std::sync::Arc;

use crate::AppState;
use crate::models::HealthCheckResult;

/// Run the diagnostic health checks
///
/// Always answers 200; failures are reported per check, or as a single
/// `Connection` entry when the database is unreachable.
#[utoipa::path(
    get,
    path = "/api/health-check",
    responses(
        (status = 200, description = "Ordered check results", body = Vec<HealthCheckResult>)
    ),
    tag = "Monitoring"
)]
pub async fn run_health_check(State(state): State<Arc<AppState>>) -> Json<Vec<HealthCheckResult>> {
    Json(state.health_check_service.run_checks().await)
}
