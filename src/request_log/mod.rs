//! Request logging subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → middleware.rs (replica id, path, client address)
//!     → logger.rs queue (try_send, never awaits)
//!     → worker task → Storage::log_request
//!
//! request continues to its handler immediately
//! ```
//!
//! # Design Decisions
//! - Best effort: each entry is attempted at most once
//! - Failures are logged and counted, never returned to the client
//! - Under a storage outage logging degrades to a no-op

pub mod logger;
pub mod middleware;

pub use logger::{drain, RequestLogWorker, RequestLogger};
pub use middleware::record_request;
