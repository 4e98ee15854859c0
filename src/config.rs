use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::models::HealthCheckDefinition;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub target: TargetConfig,
    pub logging: LoggingConfig,
    pub sampler: SamplerConfig,
    pub queries: QueryCatalog,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Local store for the KPI history
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

/// The monitored database server.
///
/// Never validated at startup: a missing address or bad port is reported by
/// the connection provider on first use.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub driver: TargetDriver,
    pub address: Option<String>,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Enable TLS on the wire
    pub encrypt: bool,
    /// Verify the server certificate when TLS is on. Off by default for
    /// self-signed installations.
    pub validate_certificate: bool,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub connect_timeout_secs: u64,
}

/// Wire protocol spoken to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDriver {
    /// SAP HANA SQL command network protocol
    #[default]
    Hana,
    /// MySQL protocol, for MySQL-compatible targets with their own `[queries]`
    Mysql,
}

impl std::str::FromStr for TargetDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hana" => Ok(TargetDriver::Hana),
            "mysql" => Ok(TargetDriver::Mysql),
            other => Err(format!("unknown driver '{}' (expected hana or mysql)", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Background KPI sampler
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Sampling period in seconds (default: 60)
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub interval_secs: u64,
    /// How late a tick may start before it is skipped (default: 900)
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub misfire_grace_secs: u64,
    pub enabled: bool,
}

/// Monitoring statements issued against the target.
///
/// Defaults read the HANA monitoring views.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryCatalog {
    /// One row, one `Available <A>, Used <U>` string
    pub cpu: String,
    /// One row of (used GB, total GB), already rounded
    pub memory: String,
    pub active_sessions: String,
    /// (connection id, client host, client ip, status), ordered by id
    pub sessions: String,
    /// (schema, table, record count, memory MB), largest first
    pub tables: String,
    pub health_checks: Vec<HealthCheckDefinition>,
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "hana-pulse")]
#[command(version, about = "HANA Pulse - database health monitoring service")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Server host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub server_host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// History database URL (overrides config file)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Logging level (overrides config file, e.g., "info,hana_pulse=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Sampling interval (overrides config file, e.g., "60s", "5m")
    #[arg(long, value_name = "DURATION")]
    pub sampler_interval_secs: Option<String>,

    /// Enable/disable the background sampler (overrides config file)
    #[arg(long, value_name = "BOOL")]
    pub sampler_enabled: Option<bool>,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (a `.env` file is honoured)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();

        if let Ok(path) = dotenvy::dotenv() {
            tracing::info!("Loaded environment from {}", path.display());
        }

        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(&cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_DATABASE_URL: history store (default: sqlite://data/hana_pulse.db)
    /// - APP_LOG_LEVEL
    /// - APP_SAMPLER_INTERVAL_SECS, APP_SAMPLER_MISFIRE_GRACE_SECS (accept "60s", "15m")
    /// - APP_SAMPLER_ENABLED
    /// - APP_TARGET_DRIVER: hana (default) or mysql
    /// - HANA_ADDRESS, HANA_PORT, HANA_USER, HANA_PASSWORD
    /// - HANA_ENCRYPT, HANA_SSL_VALIDATE_CERTIFICATE (true/false)
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(db_url) = std::env::var("APP_DATABASE_URL") {
            self.database.url = db_url;
            tracing::info!("Override database.url from env");
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(interval) = std::env::var("APP_SAMPLER_INTERVAL_SECS") {
            match parse_duration_to_secs(&interval) {
                Ok(val) => {
                    self.sampler.interval_secs = val;
                    tracing::info!(
                        "Override sampler.interval_secs from env: {}",
                        self.sampler.interval_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_SAMPLER_INTERVAL_SECS '{}': {} (keep {})",
                    interval,
                    e,
                    self.sampler.interval_secs
                ),
            }
        }

        if let Ok(grace) = std::env::var("APP_SAMPLER_MISFIRE_GRACE_SECS") {
            match parse_duration_to_secs(&grace) {
                Ok(val) => self.sampler.misfire_grace_secs = val,
                Err(e) => tracing::warn!(
                    "Invalid APP_SAMPLER_MISFIRE_GRACE_SECS '{}': {} (keep {})",
                    grace,
                    e,
                    self.sampler.misfire_grace_secs
                ),
            }
        }

        if let Ok(enabled) = std::env::var("APP_SAMPLER_ENABLED")
            && let Ok(val) = enabled.parse()
        {
            self.sampler.enabled = val;
            tracing::info!("Override sampler.enabled from env: {}", self.sampler.enabled);
        }

        if let Ok(driver) = std::env::var("APP_TARGET_DRIVER") {
            match driver.parse() {
                Ok(val) => {
                    self.target.driver = val;
                    tracing::info!("Override target.driver from env: {:?}", self.target.driver);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_TARGET_DRIVER: {} (keep {:?})",
                    e,
                    self.target.driver
                ),
            }
        }

        if let Ok(address) = std::env::var("HANA_ADDRESS") {
            self.target.address = Some(address).filter(|a| !a.trim().is_empty());
        }

        if let Ok(port) = std::env::var("HANA_PORT") {
            // Port 0 is refused by the connector, so a typo shows up on first use
            self.target.port = port.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid HANA_PORT '{}'", port);
                0
            });
        }

        if let Ok(user) = std::env::var("HANA_USER") {
            self.target.user = user;
        }

        if let Ok(password) = std::env::var("HANA_PASSWORD") {
            self.target.password = password;
        }

        if let Ok(encrypt) = std::env::var("HANA_ENCRYPT") {
            self.target.encrypt = encrypt.trim().eq_ignore_ascii_case("true");
        }

        if let Ok(validate) = std::env::var("HANA_SSL_VALIDATE_CERTIFICATE") {
            self.target.validate_certificate = validate.trim().eq_ignore_ascii_case("true");
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.server_host {
            self.server.host = host.clone();
            tracing::info!("Override server.host from CLI: {}", self.server.host);
        }

        if let Some(port) = args.server_port {
            self.server.port = port;
            tracing::info!("Override server.port from CLI: {}", self.server.port);
        }

        if let Some(db_url) = &args.database_url {
            self.database.url = db_url.clone();
            tracing::info!("Override database.url from CLI");
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }

        if let Some(interval) = &args.sampler_interval_secs {
            match parse_duration_to_secs(interval) {
                Ok(val) => {
                    self.sampler.interval_secs = val;
                    tracing::info!(
                        "Override sampler.interval_secs from CLI: {}",
                        self.sampler.interval_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid --sampler-interval-secs '{}': {} (keep {})",
                    interval,
                    e,
                    self.sampler.interval_secs
                ),
            }
        }

        if let Some(enabled) = args.sampler_enabled {
            self.sampler.enabled = enabled;
            tracing::info!("Override sampler.enabled from CLI: {}", self.sampler.enabled);
        }
    }

    /// Validate the settings the service itself needs to come up
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.sampler.interval_secs == 0 {
            anyhow::bail!("sampler.interval_secs must be > 0");
        }

        if self.target.address.is_none() {
            tracing::warn!("No target address configured; database calls will fail until HANA_ADDRESS is set");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, anyhow::Error> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5000 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://data/hana_pulse.db".to_string() }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            driver: TargetDriver::Hana,
            address: None,
            port: 39015,
            user: String::new(),
            password: String::new(),
            encrypt: false,
            validate_certificate: false,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,hana_pulse=debug".to_string(), file: Some("logs/hana_pulse.log".to_string()) }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { interval_secs: 60, misfire_grace_secs: 900, enabled: true }
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self {
            cpu: "SELECT VALUE FROM M_SYSTEM_OVERVIEW WHERE NAME = 'CPU'".to_string(),
            memory: "SELECT ROUND(SUM(TOTAL_MEMORY_USED_SIZE) / 1024/1024/1024, 2), \
                     ROUND(MAX(EFFECTIVE_ALLOCATION_LIMIT) / 1024/1024/1024, 2) \
                     FROM M_SERVICE_MEMORY"
                .to_string(),
            active_sessions:
                "SELECT COUNT(*) FROM M_CONNECTIONS WHERE CONNECTION_STATUS = 'RUNNING'"
                    .to_string(),
            sessions: "SELECT CONNECTION_ID, CLIENT_HOST, CLIENT_IP, CONNECTION_STATUS \
                       FROM M_CONNECTIONS WHERE CONNECTION_STATUS = 'RUNNING' \
                       ORDER BY CONNECTION_ID"
                .to_string(),
            tables: "SELECT TOP 100 SCHEMA_NAME, TABLE_NAME, RECORD_COUNT, \
                     ROUND(MEMORY_SIZE_IN_TOTAL / 1024 / 1024, 2) AS MEMORY_MB \
                     FROM M_CS_TABLES ORDER BY MEMORY_SIZE_IN_TOTAL DESC"
                .to_string(),
            health_checks: vec![
                HealthCheckDefinition {
                    name: "Last Successful Data Backup".to_string(),
                    query: "SELECT TOP 1 SYS_START_TIME, ENTRY_TYPE_NAME, STATE_NAME \
                            FROM M_BACKUP_CATALOG \
                            WHERE ENTRY_TYPE_NAME = 'complete data backup' \
                            AND STATE_NAME = 'successful' \
                            ORDER BY SYS_START_TIME DESC"
                        .to_string(),
                },
                HealthCheckDefinition {
                    name: "Active Transactions".to_string(),
                    query: "SELECT HOST, PORT, CONNECTION_ID, TRANSACTION_ID \
                            FROM M_TRANSACTIONS WHERE TRANSACTION_STATUS = 'ACTIVE'"
                        .to_string(),
                },
            ],
        }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(n),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(n * 60),
        "h" | "hr" | "hour" | "hours" => Ok(n * 60 * 60),
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

// Accepts either a number of seconds or a human-friendly string
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '5m', '1h'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
