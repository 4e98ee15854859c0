use axum::{Json, extract::State};
use std::sync::Arc;

use crate::AppState;
use crate::models::TableInfo;
use crate::utils::ApiResult;

/// List the 100 largest column tables by memory size
#[utoipa::path(
    get,
    path = "/api/tables",
    responses(
        (status = 200, description = "Tables by memory footprint", body = Vec<TableInfo>),
        (status = 500, description = "Connection or query failure")
    ),
    tag = "Inventory"
)]
pub async fn list_tables(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<TableInfo>>> {
    let tables = state.inventory_service.tables().await?;
    Ok(Json(tables))
}
