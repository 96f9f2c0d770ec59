//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (pool size, queue capacity, windows > 0)
//! - Check values that would otherwise fail every insert (server id length)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// Longest replica id the `server_id` columns can hold.
pub const MAX_SERVER_ID_LEN: usize = 50;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check the configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(id) = &config.server_id {
        if id.trim().is_empty() {
            errors.push(ValidationError::new("server_id", "must not be blank"));
        } else if id.chars().count() > MAX_SERVER_ID_LEN {
            errors.push(ValidationError::new(
                "server_id",
                format!("must be at most {} characters", MAX_SERVER_ID_LEN),
            ));
        }
    }

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("listener.host", "must not be empty"));
    }
    if config.database.host.trim().is_empty() {
        errors.push(ValidationError::new("database.host", "must not be empty"));
    }
    if config.database.name.trim().is_empty() {
        errors.push(ValidationError::new("database.name", "must not be empty"));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be greater than 0"));
    }
    if config.request_log.queue_capacity == 0 {
        errors.push(ValidationError::new("request_log.queue_capacity", "must be greater than 0"));
    }
    if config.stats.recent_window_secs == 0 {
        errors.push(ValidationError::new("stats.recent_window_secs", "must be greater than 0"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
