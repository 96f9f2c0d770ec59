//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Install the global subscriber.
///
/// Returns an error if a subscriber is already installed.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
}

fn default_directives(level: &str) -> String {
    format!("{level},replica_api={level},tower_http={level},sqlx=warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_sqlx() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("sqlx=warn"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
