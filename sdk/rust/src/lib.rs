//! Typed client for a replica's HTTP API.

pub mod client;
pub mod types;

pub use client::{ClientError, ReplicaClient, Served, SERVED_BY};
pub use types::*;
