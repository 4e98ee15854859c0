use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Open the local history database, creating it if needed, and run migrations.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, anyhow::Error> {
    if let Some(path) = database_url.strip_prefix("sqlite://")
        && !path.starts_with(':')
        && let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;

    tracing::info!("Running history store migrations");
    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}
