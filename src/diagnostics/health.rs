//! Liveness probe.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::response::timestamp;
use crate::http::server::AppState;
use crate::identity::ReplicaId;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub server: ReplicaId,
    pub timestamp: String,
    /// Process uptime in seconds.
    pub uptime: f64,
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "healthy",
        server: state.replica.clone(),
        timestamp: timestamp(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}
