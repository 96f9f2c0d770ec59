//! Replica backend for a load-balanced demo API.

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod request_log;
pub mod storage;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::schema::AppConfig;
pub use http::{AppState, HttpServer};
pub use identity::ReplicaId;
pub use lifecycle::{Application, Shutdown};
pub use storage::{PgStorage, Storage};
