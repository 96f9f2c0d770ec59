//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, tracing span)
//!     → request_log (fire-and-forget log entry)
//!     → api / diagnostics handlers
//!     → response.rs (x-served-by, security headers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::X_SERVED_BY;
pub use server::{AppState, HttpServer};
