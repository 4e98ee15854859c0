pub mod alert_log;
pub mod connection;
pub mod hana_connector;
pub mod health_check_service;
pub mod history_store;
pub mod inventory_service;
pub mod kpi_collector;
pub mod kpi_sampler;
pub mod mysql_connector;
pub mod script_executor;

pub use alert_log::AlertLog;
pub use connection::{ConnectionProvider, DbConnection, QueryResult, TlsMode, provider_for};
pub use hana_connector::HanaConnector;
pub use health_check_service::HealthCheckService;
pub use history_store::HistoryStore;
pub use inventory_service::InventoryService;
pub use kpi_collector::KpiCollector;
pub use kpi_sampler::{KpiSampler, SampleOutcome};
pub use mysql_connector::MySqlConnector;
pub use script_executor::{ScriptExecutor, classify_statement};
