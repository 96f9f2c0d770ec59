//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment variables (loader.rs)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared with every subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at process start and never reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_sources, ConfigError};
pub use schema::AppConfig;
pub use schema::DatabaseConfig;
pub use schema::Environment;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::RequestLogConfig;
pub use schema::SecurityConfig;
