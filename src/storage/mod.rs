//! Storage gateway subsystem.
//!
//! # Data Flow
//! ```text
//! handlers / request logger
//!     → Storage trait (this module)
//!     → postgres.rs (parameterized statements over a shared PgPool)
//!     → shared relational store
//! ```
//!
//! # Design Decisions
//! - One pool per process, owned here; nothing else opens connections
//! - Each statement runs on its own: no retries, no transactions
//! - Schema creation is idempotent and its failure is not fatal
//! - Rows are transient; nothing is cached in-process

pub mod models;
pub mod postgres;
pub mod schema;

use std::time::Duration;

use async_trait::async_trait;

pub use models::{EndpointCount, NewUser, RequestLogEntry, User};
pub use postgres::PgStorage;

/// Errors raised by the shared store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connectivity, constraint, or query failure reported by the driver.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Message suitable for passing back to the client verbatim.
    ///
    /// For server-side errors this is the database's own message
    /// (e.g. a unique constraint violation), otherwise the driver's.
    pub fn detail(&self) -> String {
        match self {
            StorageError::Database(sqlx::Error::Database(db)) => db.message().to_string(),
            StorageError::Database(other) => other.to_string(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Operations the service performs against the shared store.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create `users` and `requests_log` if they do not exist.
    async fn initialize_schema(&self) -> StorageResult<()>;

    /// All users, newest first.
    async fn list_users(&self) -> StorageResult<Vec<User>>;

    /// Insert a user and return the stored row.
    async fn create_user(&self, user: &NewUser) -> StorageResult<User>;

    /// Users created by any replica.
    async fn count_users(&self) -> StorageResult<i64>;

    /// Requests logged by `server_id`.
    async fn count_requests(&self, server_id: &str) -> StorageResult<i64>;

    /// Per-endpoint request counts for `server_id` within the trailing `window`.
    async fn recent_requests(
        &self,
        server_id: &str,
        window: Duration,
    ) -> StorageResult<Vec<EndpointCount>>;

    /// Append one entry to `requests_log`.
    async fn log_request(&self, entry: &RequestLogEntry) -> StorageResult<()>;
}
