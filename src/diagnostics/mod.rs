//! Identity and diagnostics endpoints.
//!
//! # Responsibilities
//! - Liveness for the balancer (`/health`)
//! - Host metadata to observe which replica answered (`/server-info`)
//! - Endpoint directory (`/`)
//!
//! # Design Decisions
//! - Never touch storage: these stay green during a database outage
//! - No failure path; host readings fall back to zero / "unknown"

pub mod health;
pub mod info;
pub mod root;
pub mod system;

pub use health::health;
pub use info::server_info;
pub use root::index;
pub use system::SystemProbe;
