use axum::{Json, extract::State};
use std::sync::Arc;

use crate::AppState;
use crate::models::HistoricalSeries;
use crate::utils::ApiResult;

/// KPI history of the last 24 hours, oldest first
#[utoipa::path(
    get,
    path = "/api/historical-kpis",
    responses(
        (status = 200, description = "Chart series", body = HistoricalSeries),
        (status = 500, description = "History store failure")
    ),
    tag = "Monitoring"
)]
pub async fn get_historical_kpis(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<HistoricalSeries>> {
    let records = state.history_store.window(chrono::Duration::hours(24)).await?;
    Ok(Json(HistoricalSeries::from(records.as_slice())))
}
