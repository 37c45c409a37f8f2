//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// OTB alert thresholds.
    #[serde(default)]
    pub otb: OtbSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key shared with the identity service.
    pub secret: String,
    /// Access token expiration in minutes.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expires_minutes: i64,
}

fn default_access_token_expiry() -> i64 {
    60
}

/// Percent thresholds used when raising OTB alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OtbSettings {
    /// Available below this percent of planned raises `low_otb`.
    #[serde(default = "default_low_otb_percent")]
    pub low_otb_percent: u32,
    /// Consumption below this percent raises `underutilized`.
    #[serde(default = "default_underutilized_percent")]
    pub underutilized_percent: u32,
    /// Deviation from the mean planned above this percent raises `category_imbalance`.
    #[serde(default = "default_imbalance_percent")]
    pub imbalance_percent: u32,
}

fn default_low_otb_percent() -> u32 {
    20
}

fn default_underutilized_percent() -> u32 {
    50
}

fn default_imbalance_percent() -> u32 {
    25
}

impl Default for OtbSettings {
    fn default() -> Self {
        Self {
            low_otb_percent: default_low_otb_percent(),
            underutilized_percent: default_underutilized_percent(),
            imbalance_percent: default_imbalance_percent(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Environment variables use the `STOCKPLAN` prefix and `__` as the
    /// section separator, e.g. `STOCKPLAN__DATABASE__URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("STOCKPLAN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
