//! Replica identity.
//!
//! Every response and every stored row is stamped with the id of the replica
//! that produced it. The id is resolved once at startup and is read-only
//! afterwards; handlers receive it through application state.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::config::validation::MAX_SERVER_ID_LEN;
use crate::storage::models::truncate_chars;

/// Identifier of this running instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplicaId(Arc<str>);

impl ReplicaId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Use the configured id, falling back to the host name.
    pub fn resolve(configured: Option<&str>) -> Self {
        match configured.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::new(id),
            None => Self::from_hostname(&local_hostname()),
        }
    }

    /// Host names can exceed what the `server_id` columns hold; cut them to fit.
    fn from_hostname(hostname: &str) -> Self {
        let id = truncate_chars(hostname, MAX_SERVER_ID_LEN);
        if id.len() < hostname.len() {
            tracing::warn!(
                hostname,
                server = id,
                max_len = MAX_SERVER_ID_LEN,
                "Host name too long for a replica id, truncated"
            );
        }
        Self::new(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Host name of the machine, or `"unknown"` if it cannot be read.
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReplicaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ReplicaId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
