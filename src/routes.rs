use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{AppState, handlers, models};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::kpi::get_kpis,
        handlers::script::execute_script,
        handlers::sessions::get_sessions,
        handlers::tables::list_tables,
        handlers::history::get_historical_kpis,
        handlers::health::run_health_check,
        handlers::alerts::list_alerts,
    ),
    components(
        schemas(
            models::KpiSample,
            models::MemoryUsage,
            models::ScriptRequest,
            models::ScriptResponse,
            models::SessionInfo,
            models::TableInfo,
            models::HistoricalSeries,
            models::HealthCheckResult,
            models::CheckStatus,
            models::AlertEntry,
            models::AlertLevel,
        )
    ),
    tags(
        (name = "Monitoring", description = "KPIs, history, health checks and alerts"),
        (name = "Inventory", description = "Sessions and tables on the monitored server"),
        (name = "Scripts", description = "Ad-hoc statement execution"),
    )
)]
pub struct ApiDoc;

/// API routes only, without docs or middleware
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/kpis", get(handlers::kpi::get_kpis))
        .route("/api/execute-script", post(handlers::script::execute_script))
        .route("/api/sessions", get(handlers::sessions::get_sessions))
        .route("/api/tables", get(handlers::tables::list_tables))
        .route("/api/historical-kpis", get(handlers::history::get_historical_kpis))
        .route("/api/health-check", get(handlers::health::run_health_check))
        .route("/api/alerts", get(handlers::alerts::list_alerts))
        .with_state(state)
}

/// Full application router: API, liveness probes and Swagger UI
pub fn build_router(state: Arc<AppState>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check));

    Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router(state))
        .merge(health_routes)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn ready_check() -> &'static str {
    "READY"
}
