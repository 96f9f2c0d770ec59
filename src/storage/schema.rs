//! Table definitions and statements for the shared store.

pub const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(100) UNIQUE NOT NULL,
    created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
    server_id VARCHAR(50)
)
"#;

pub const CREATE_REQUESTS_LOG: &str = r#"
CREATE TABLE IF NOT EXISTS requests_log (
    id SERIAL PRIMARY KEY,
    server_id VARCHAR(50) NOT NULL,
    endpoint VARCHAR(100) NOT NULL,
    timestamp TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
    ip_address VARCHAR(45)
)
"#;

pub const SELECT_USERS: &str =
    "SELECT id, name, email, created_at, server_id FROM users ORDER BY created_at DESC, id DESC";

pub const INSERT_USER: &str = "INSERT INTO users (name, email, server_id) VALUES ($1, $2, $3) \
     RETURNING id, name, email, created_at, server_id";

pub const COUNT_USERS: &str = "SELECT COUNT(*) FROM users";

pub const COUNT_REQUESTS: &str = "SELECT COUNT(*) FROM requests_log WHERE server_id = $1";

// $2 is the window length in seconds.
pub const RECENT_REQUESTS: &str = "SELECT endpoint, COUNT(*) AS count FROM requests_log \
     WHERE server_id = $1 AND timestamp > NOW() - ($2 * INTERVAL '1 second') \
     GROUP BY endpoint ORDER BY count DESC, endpoint";

pub const INSERT_REQUEST_LOG: &str =
    "INSERT INTO requests_log (server_id, endpoint, ip_address) VALUES ($1, $2, $3)";
