//! Configuration management for ReviewFlow services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Notification service configuration
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Reviewer matching configuration
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Reconciler job configuration
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    /// Notification service endpoint; delivery is disabled when unset
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Number of candidates returned when the caller does not ask for more
    #[serde(default = "default_match_results")]
    pub default_max_results: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcilerConfig {
    /// Seconds between overdue-review scans
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Maximum overdue reviews processed per scan
    #[serde(default = "default_scan_batch")]
    pub scan_batch_size: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_max_connections() -> u32 { 50 }
fn default_min_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_notify_timeout() -> u64 { 5 }
fn default_match_results() -> usize { crate::DEFAULT_MATCH_RESULTS }
fn default_scan_interval() -> u64 { 300 }
fn default_scan_batch() -> u64 { 500 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "reviewflow".to_string() }

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_notify_timeout(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_max_results: default_match_results(),
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            scan_batch_size: default_scan_batch(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__DATABASE__URL=postgres://...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the reconciler scan interval as Duration
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.reconciler.scan_interval_secs)
    }

    /// Get the notification timeout as Duration
    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification.timeout_secs)
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgres://localhost/reviewflow".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            notification: NotificationConfig::default(),
            matching: MatchingConfig::default(),
            reconciler: ReconcilerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.matching.default_max_results, 3);
        assert_eq!(config.reconciler.scan_interval_secs, 300);
        assert!(config.notification.endpoint.is_none());
    }

    #[test]
    fn test_read_database_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.read_database_url(), "postgres://localhost/reviewflow");
    }

    #[test]
    fn test_scan_interval_duration() {
        let config = AppConfig::default();
        assert_eq!(config.scan_interval(), Duration::from_secs(300));
    }
}
