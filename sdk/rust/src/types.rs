use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub server: String,
    pub timestamp: String,
    pub uptime: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub total: String,
    pub free: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub server_id: String,
    pub hostname: String,
    pub platform: String,
    pub memory: Memory,
    pub load_average: Vec<f64>,
    pub request_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    pub health: String,
    pub server_info: String,
    pub api_users: String,
    pub api_stats: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub message: String,
    pub server: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: Option<String>,
    pub server_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<User>,
    pub server: String,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedUser {
    pub user: User,
    pub server: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointCount {
    pub endpoint: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub server: String,
    pub total_users: i64,
    pub requests_handled: i64,
    pub recent_requests: Vec<EndpointCount>,
    pub timestamp: String,
}

/// Error body returned with every 4xx/5xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub server: String,
}
