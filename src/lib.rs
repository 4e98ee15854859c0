//! HANA Pulse Library
//!
//! Database health monitoring core: KPI collection, periodic sampling into a
//! local history store, health checks and ad-hoc statement execution.

use sqlx::SqlitePool;
use std::sync::Arc;

pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::Config;
pub use services::{
    AlertLog, ConnectionProvider, HanaConnector, HealthCheckService, HistoryStore,
    InventoryService, KpiCollector, KpiSampler, MySqlConnector, ScriptExecutor,
};

/// Application shared state
///
/// Built once at startup and handed to every handler; there are no global
/// singletons. All services are wrapped in Arc for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,

    pub kpi_collector: Arc<KpiCollector>,
    pub script_executor: Arc<ScriptExecutor>,
    pub health_check_service: Arc<HealthCheckService>,
    pub inventory_service: Arc<InventoryService>,
    pub history_store: HistoryStore,
    pub alert_log: Arc<AlertLog>,

    sampler: Arc<KpiSampler>,
}

impl AppState {
    /// Wire the services around one connection provider.
    pub fn new(
        db: SqlitePool,
        provider: Arc<dyn ConnectionProvider>,
        queries: config::QueryCatalog,
    ) -> Self {
        let kpi_collector = Arc::new(KpiCollector::new(Arc::clone(&provider), queries.clone()));
        let script_executor = Arc::new(ScriptExecutor::new(Arc::clone(&provider)));
        let health_check_service = Arc::new(HealthCheckService::new(
            Arc::clone(&provider),
            queries.health_checks.clone(),
        ));
        let inventory_service = Arc::new(InventoryService::new(provider, queries));
        let history_store = HistoryStore::new(db.clone());
        let sampler =
            Arc::new(KpiSampler::new(Arc::clone(&kpi_collector), history_store.clone()));

        Self {
            db,
            history_store,
            sampler,
            kpi_collector,
            script_executor,
            health_check_service,
            inventory_service,
            alert_log: Arc::new(AlertLog::new()),
        }
    }

    /// The one sampler of this process, writing into this state's history store.
    ///
    /// Every handle shares the same single-flight flag.
    pub fn sampler(&self) -> Arc<KpiSampler> {
        Arc::clone(&self.sampler)
    }
}
