use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hana_pulse::config::Config;
use hana_pulse::services::provider_for;
use hana_pulse::utils::ScheduledExecutor;
use hana_pulse::{AppState, db, routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first
    let config = Config::load()?;

    // Initialize logging; the appender guard must outlive the server
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    let _log_guard = if let Some(log_file) = &config.logging.file {
        let log_path = std::path::Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path.parent().and_then(|p| p.to_str()).unwrap_or("logs");
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("hana_pulse.log");
        // Rolling appender adds its own date suffix
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer())
            .init();
        Some(guard)
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
        None
    };
    tracing::info!("HANA Pulse starting up");

    let pool = db::create_pool(&config.database.url).await?;
    tracing::info!("History store ready at {}", config.database.url);

    let provider = provider_for(&config.target);
    tracing::info!("Target driver: {:?}", config.target.driver);
    if config.target.encrypt && !config.target.validate_certificate {
        tracing::warn!("TLS enabled without certificate validation");
    }

    let app_state = Arc::new(AppState::new(pool, provider, config.queries.clone()));

    // Exactly one sampler per process
    if config.sampler.enabled {
        let interval = std::time::Duration::from_secs(config.sampler.interval_secs);
        let grace = std::time::Duration::from_secs(config.sampler.misfire_grace_secs);
        tracing::info!(
            "Starting KPI sampler with interval: {}s (misfire grace {}s)",
            config.sampler.interval_secs,
            config.sampler.misfire_grace_secs
        );
        let executor =
            ScheduledExecutor::new("kpi-sampler", interval).with_misfire_grace(grace);
        let sampler = app_state.sampler();
        tokio::spawn(async move {
            executor.start(sampler).await;
        });
    } else {
        tracing::warn!("KPI sampler disabled by configuration");
    }

    let app = routes::build_router(Arc::clone(&app_state));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API documentation available at http://{}/api-docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
