//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve identity → Init schema → Start log worker → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Finish in-flight → Drain request log
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: storage first, listener last (traffic only when ready)
//! - Schema initialization failure is logged, never fatal
//! - Request log drain has a deadline: pending entries are discarded after it

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{initialize_schema, Application};
