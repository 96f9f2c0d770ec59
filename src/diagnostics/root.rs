//! Endpoint directory served at `/`.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::identity::ReplicaId;

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub health: &'static str,
    pub server_info: &'static str,
    pub api_users: &'static str,
    pub api_stats: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Index {
    pub message: &'static str,
    pub server: ReplicaId,
    pub endpoints: Endpoints,
}

pub async fn index(State(state): State<AppState>) -> Json<Index> {
    Json(Index {
        message: "Load Balancer Demo API",
        server: state.replica.clone(),
        endpoints: Endpoints {
            health: "/health",
            server_info: "/server-info",
            api_users: "/api/users",
            api_stats: "/api/stats",
        },
    })
}
