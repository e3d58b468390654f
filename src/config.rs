use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL (postgres:// in production, sqlite:// in tests)
    #[validate(length(min = 1))]
    pub database_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// development | production | test
    #[serde(default = "default_env")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON instead of human-readable lines
    #[serde(default)]
    pub log_json: bool,

    /// Run embedded migrations on startup
    #[serde(default = "default_true")]
    pub auto_migrate: bool,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub db_connect_timeout_secs: u64,

    #[serde(default = "default_acquire_timeout")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub db_idle_timeout_secs: u64,

    /// Per-request deadline enforced by the HTTP layer
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_env() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_acquire_timeout() -> u64 {
    8
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_request_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Minimal constructor used by tests and tools; everything else takes
    /// the defaults.
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: true,
            db_max_connections: default_max_connections(),
            db_min_connections: default_min_connections(),
            db_connect_timeout_secs: default_connect_timeout(),
            db_acquire_timeout_secs: default_acquire_timeout(),
            db_idle_timeout_secs: default_idle_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Loads configuration from `config/default.toml`, an environment-specific
/// overlay (`config/<env>.toml`), and finally `WORKSHOP__*` environment
/// variables, later sources overriding earlier ones.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = std::env::var("WORKSHOP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let config = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("WORKSHOP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;
    Ok(app_config)
}

/// Initializes the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
