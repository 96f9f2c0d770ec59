//! Per-replica statistics.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::http::response::timestamp;
use crate::http::server::AppState;
use crate::identity::ReplicaId;
use crate::storage::EndpointCount;

/// Body of `GET /api/stats`.
#[derive(Debug, Serialize)]
pub struct Stats {
    pub server: ReplicaId,
    /// Users created by every replica (storage is shared).
    pub total_users: i64,
    /// Requests logged by this replica.
    pub requests_handled: i64,
    /// This replica's requests per endpoint within the trailing window.
    pub recent_requests: Vec<EndpointCount>,
    pub timestamp: String,
}

/// Aggregate counts from both tables.
///
/// The three reads are independent; they are not taken from one snapshot.
pub async fn stats(State(state): State<AppState>) -> Result<Json<Stats>, ApiError> {
    let server = state.replica.as_str();
    let (total_users, requests_handled, recent_requests) = tokio::try_join!(
        state.storage.count_users(),
        state.storage.count_requests(server),
        state.storage.recent_requests(server, state.stats_window),
    )
    .map_err(|e| ApiError::storage(&state.replica, e))?;

    Ok(Json(Stats {
        server: state.replica.clone(),
        total_users,
        requests_handled,
        recent_requests,
        timestamp: timestamp(),
    }))
}
