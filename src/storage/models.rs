//! Row types for the shared store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest endpoint path the `requests_log.endpoint` column holds.
pub const MAX_ENDPOINT_LEN: usize = 100;

/// Longest address the `requests_log.ip_address` column holds.
pub const MAX_IP_ADDRESS_LEN: usize = 45;

/// A row of `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub server_id: Option<String>,
}

/// Values for a user insert; id and timestamp are assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub server_id: String,
}

/// One inbound request, as recorded in `requests_log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLogEntry {
    pub server_id: String,
    pub endpoint: String,
    pub ip_address: Option<String>,
}

impl RequestLogEntry {
    /// Build an entry, clipping values to the column widths.
    pub fn new(server_id: &str, endpoint: &str, ip_address: Option<String>) -> Self {
        Self {
            server_id: server_id.to_string(),
            endpoint: truncate_chars(endpoint, MAX_ENDPOINT_LEN).to_string(),
            ip_address: ip_address.map(|ip| truncate_chars(&ip, MAX_IP_ADDRESS_LEN).to_string()),
        }
    }
}

/// Request count for one endpoint within the stats window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EndpointCount {
    pub endpoint: String,
    pub count: i64,
}

/// Prefix of `value` holding at most `max` characters.
pub(crate) fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
