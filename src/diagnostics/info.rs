//! Host metadata used to observe request distribution.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::response::timestamp;
use crate::http::server::AppState;
use crate::identity::ReplicaId;

#[derive(Debug, Serialize)]
pub struct Memory {
    pub total: String,
    pub free: String,
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub server_id: ReplicaId,
    pub hostname: String,
    pub platform: &'static str,
    pub memory: Memory,
    pub load_average: [f64; 3],
    pub request_time: String,
}

pub async fn server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    let host = state.system.snapshot();
    Json(ServerInfo {
        server_id: state.replica.clone(),
        hostname: host.hostname,
        platform: host.platform,
        memory: Memory {
            total: format!("{}MB", host.total_memory_mb),
            free: format!("{}MB", host.free_memory_mb),
        },
        load_average: host.load_average,
        request_time: timestamp(),
    })
}
