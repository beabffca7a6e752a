//! Application Configuration
//!
//! Loaded from an optional TOML file (path in `DASHBOARD_CONFIG`, default
//! `dashboard.toml`) layered with `DASHBOARD__*` environment variables,
//! e.g. `DASHBOARD__SERVER__BIND=127.0.0.1:9000`.

use aggregator::AggregatorConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::rate_limit::RateLimitConfig;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "DASHBOARD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "dashboard.toml";
const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Directory the sensor log paths are resolved against
    pub log_root: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            log_root: "/home/fast-and-furious/main".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub rate_limit: RateLimitConfig,
    pub aggregator: AggregatorConfig,
}

impl AppConfig {
    /// Load from the file named by `DASHBOARD_CONFIG` and the environment
    pub fn load() -> Result<Self, ApiError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load from `path` (optional) and the environment
    pub fn load_from(path: &str) -> Result<Self, ApiError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from("/nonexistent/dashboard.toml").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.aggregator.tail_lines, 100);
        assert_eq!(config.aggregator.source_offset_minutes, 330);
    }

    #[test]
    fn test_file_overrides_nested_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
log_root = "/data/logs"

[aggregator]
fetch_timeout_secs = 5

[aggregator.freshness]
alerting_secs = 10

[aggregator.alerts]
speed_warning_kmh = 70.0
"#
        )
        .unwrap();

        let config = AppConfig::load_from(&file.path().to_string_lossy()).unwrap();
        assert_eq!(config.server.log_root, "/data/logs");
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.aggregator.fetch_timeout_secs, 5);
        assert_eq!(config.aggregator.freshness.alerting_secs, 10);
        assert_eq!(config.aggregator.freshness.display_secs, 90);
        assert_eq!(config.aggregator.alerts.speed_warning_kmh, 70.0);
        assert_eq!(config.aggregator.alerts.speed_critical_kmh, 130.0);
    }
}
