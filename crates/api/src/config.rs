use std::net::SocketAddr;
use std::time::Duration;

use domain::services::{AggregatorConfig, NetworkAttribution};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub aggregation: AggregationConfig,
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    /// Per-call timeout for every source query, in milliseconds
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,

    /// Range used when a request names none
    #[serde(default = "default_range_days")]
    pub default_range_days: u32,

    /// Whether packages that fail catalog resolution still count toward
    /// network totals
    #[serde(default)]
    pub network_attribution: NetworkAttribution,
}

impl AggregationConfig {
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            source_timeout: Duration::from_millis(self.source_timeout_ms),
            network_attribution: self.network_attribution,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// JSON usage snapshot exported from a device; re-read on every refresh
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> LogFormat {
    LogFormat::Json
}
fn default_source_timeout_ms() -> u64 {
    5000
}
fn default_range_days() -> u32 {
    7
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with AU__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("AU").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds entirely from embedded defaults so tests never touch config files.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            request_timeout_secs = 30

            [logging]
            level = "info"
            format = "json"

            [aggregation]
            source_timeout_ms = 5000
            default_range_days = 7
            network_attribution = "all_queried"

            [snapshot]
            path = "data/sample_snapshot.json"

            [security]
            cors_origins = []
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.snapshot.path.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "AU__SNAPSHOT__PATH environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.aggregation.source_timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "aggregation.source_timeout_ms must be greater than 0".to_string(),
            ));
        }

        shared::validation::validate_range_days(self.aggregation.default_range_days).map_err(
            |_| {
                ConfigValidationError::InvalidValue(
                    "aggregation.default_range_days must be between 1 and 365".to_string(),
                )
            },
        )?;

        self.socket_addr().map_err(|_| {
            ConfigValidationError::InvalidValue(format!(
                "Invalid listen address {}:{}",
                self.server.host, self.server.port
            ))
        })?;

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
