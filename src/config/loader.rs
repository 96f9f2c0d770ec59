//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::{AppConfig, Environment};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the effective configuration for this process.
///
/// Defaults, then the optional TOML file, then environment variables.
/// The result is validated once and never changes afterwards.
pub fn load_from_sources(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply recognized environment variables on top of `config`.
///
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(id) = get("SERVER_ID") {
        config.server_id = Some(id);
    }
    if let Some(env) = get("APP_ENV") {
        config.environment = Environment::try_from(env.as_str())
            .map_err(|message| ConfigError::Env { var: "APP_ENV", message })?;
    }
    if let Some(host) = get("HOST") {
        config.listener.host = host;
    }
    if let Some(port) = get("PORT") {
        config.listener.port = parse_var("PORT", &port)?;
    }
    if let Some(trust) = get("TRUST_PROXY") {
        config.listener.trust_proxy = parse_flag("TRUST_PROXY", &trust)?;
    }
    if let Some(host) = get("DB_HOST") {
        config.database.host = host;
    }
    if let Some(port) = get("DB_PORT") {
        config.database.port = parse_var("DB_PORT", &port)?;
    }
    if let Some(name) = get("DB_NAME") {
        config.database.name = name;
    }
    if let Some(user) = get("DB_USER") {
        config.database.user = user;
    }
    if let Some(password) = get("DB_PASSWORD") {
        config.database.password = Some(password);
    }
    if let Some(ssl) = get("DB_SSL") {
        config.database.require_tls = Some(parse_flag("DB_SSL", &ssl)?);
    }
    if let Some(addr) = get("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = addr;
    }

    Ok(())
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        message: format!("'{}': {}", value, e),
    })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            var,
            message: format!("'{}' is not a boolean", value),
        }),
    }
}
