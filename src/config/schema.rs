//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a replica.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for a replica.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Replica identifier. Falls back to the host name when unset.
    pub server_id: Option<String>,

    /// Deployment mode.
    pub environment: Environment,

    /// Listener configuration (bind host, port, proxy trust).
    pub listener: ListenerConfig,

    /// Shared relational store.
    pub database: DatabaseConfig,

    /// Request logging settings.
    pub request_log: RequestLogConfig,

    /// Statistics endpoint settings.
    pub stats: StatsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Response hardening and limits.
    pub security: SecurityConfig,
}

/// Deployment mode.
///
/// Drives the default log format and how strictly database TLS
/// certificates are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl TryFrom<&str> for Environment {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "test" => Ok(Self::Development),
            other => Err(format!("{} is not a supported environment", other)),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Take the client address from `X-Forwarded-For` instead of the peer.
    pub trust_proxy: bool,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            trust_proxy: false,
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: Option<String>,

    /// Require TLS. When unset, TLS is required in production only.
    pub require_tls: Option<bool>,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before failing a query.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "loadbalancer_demo".to_string(),
            user: "postgres".to_string(),
            password: None,
            require_tls: None,
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

/// Request logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestLogConfig {
    /// Record every inbound request in `requests_log`.
    pub enabled: bool,

    /// Entries buffered before new ones are dropped.
    pub queue_capacity: usize,

    /// Seconds the worker may spend draining the queue at shutdown.
    pub drain_timeout_secs: u64,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: 1024,
            drain_timeout_secs: 5,
        }
    }
}

/// Statistics endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Trailing window for the per-endpoint breakdown, in seconds.
    pub recent_window_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            recent_window_secs: 3600,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format. Defaults to JSON in production, pretty otherwise.
    pub log_format: Option<LogFormat>,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Allow cross-origin requests from any origin.
    pub cors_enabled: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            cors_enabled: true,
            max_body_size: 100 * 1024, // 100KB
        }
    }
}

impl AppConfig {
    /// Whether database connections must use TLS.
    pub fn database_tls_required(&self) -> bool {
        self.database
            .require_tls
            .unwrap_or_else(|| self.environment.is_production())
    }

    /// Effective log format for this deployment.
    pub fn log_format(&self) -> LogFormat {
        self.observability.log_format.unwrap_or(if self.environment.is_production() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.listener.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "loadbalancer_demo");
        assert_eq!(config.database.user, "postgres");
        assert!(config.database.password.is_none());
        assert!(config.server_id.is_none());
        assert!(config.request_log.enabled);
        assert_eq!(config.stats.recent_window_secs, 3600);
    }

    #[test]
    fn test_tls_follows_environment_unless_set() {
        let mut config = AppConfig::default();
        assert!(!config.database_tls_required());

        config.environment = Environment::Production;
        assert!(config.database_tls_required());

        config.database.require_tls = Some(false);
        assert!(!config.database_tls_required());
    }

    #[test]
    fn test_log_format_defaults_by_environment() {
        let mut config = AppConfig::default();
        assert_eq!(config.log_format(), LogFormat::Pretty);

        config.environment = Environment::Production;
        assert_eq!(config.log_format(), LogFormat::Json);

        config.observability.log_format = Some(LogFormat::Pretty);
        assert_eq!(config.log_format(), LogFormat::Pretty);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            server_id = "r1"
            environment = "production"

            [database]
            host = "db.internal"
            "#,
        )
        .unwrap();

        assert_eq!(config.server_id.as_deref(), Some("r1"));
        assert!(config.environment.is_production());
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.listener.port, 3000);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::try_from("Production"), Ok(Environment::Production));
        assert_eq!(Environment::try_from("dev"), Ok(Environment::Development));
        assert!(Environment::try_from("staging").is_err());
    }
}
