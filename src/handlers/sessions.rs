use axum::{Json, extract::State};
use std::sync::Arc;

use crate::AppState;
use crate::models::SessionInfo;
use crate::utils::ApiResult;

/// List running sessions (connections), ordered by connection id
#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "Sessions list", body = Vec<SessionInfo>),
        (status = 500, description = "Connection or query failure")
    ),
    tag = "Inventory"
)]
pub async fn get_sessions(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SessionInfo>>> {
    let sessions = state.inventory_service.sessions().await?;
    tracing::debug!("Found {} running sessions", sessions.len());
    Ok(Json(sessions))
}
