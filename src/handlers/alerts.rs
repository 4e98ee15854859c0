use axum::{Json, extract::State};
use std::sync::Arc;

use crate::AppState;
use crate::models::AlertEntry;

/// Recent alerts, newest first (at most 50)
#[utoipa::path(
    get,
    path = "/api/alerts",
    responses(
        (status = 200, description = "Alert log", body = Vec<AlertEntry>)
    ),
    tag = "Monitoring"
)]
pub async fn list_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AlertEntry>> {
    Json(state.alert_log.recent())
}
