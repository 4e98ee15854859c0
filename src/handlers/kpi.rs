use axum::{Json, extract::State};
use std::sync::Arc;

use crate::AppState;
use crate::models::KpiSample;

/// Collect CPU, memory and session KPIs now
///
/// Per-metric failures show up as `"N/A"` / `"Error"`; a connection failure
/// sets `error` and still answers 200.
#[utoipa::path(
    get,
    path = "/api/kpis",
    responses(
        (status = 200, description = "Current KPI sample", body = KpiSample)
    ),
    tag = "Monitoring"
)]
pub async fn get_kpis(State(state): State<Arc<AppState>>) -> Json<KpiSample> {
    Json(state.kpi_collector.fetch().await)
}
