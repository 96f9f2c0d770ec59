//! PostgreSQL storage over a shared `sqlx` pool.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};

use crate::config::{DatabaseConfig, Environment};
use crate::storage::models::{EndpointCount, NewUser, RequestLogEntry, User};
use crate::storage::schema;
use crate::storage::{Storage, StorageResult};

/// Storage gateway backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Create the pool without opening any connection.
    ///
    /// Connections are established on first use, so an unreachable database
    /// surfaces as per-query errors instead of a startup failure.
    pub fn connect_lazy(config: &DatabaseConfig, tls_required: bool, environment: Environment) -> Self {
        let options = connect_options(config, ssl_mode(tls_required, environment));
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            tls_required,
            "Database pool created"
        );

        Self { pool }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn connect_options(config: &DatabaseConfig, ssl_mode: PgSslMode) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .ssl_mode(ssl_mode);

    match &config.password {
        Some(password) => options.password(password),
        None => options,
    }
}

/// TLS mode for a deployment.
///
/// Production only requires an encrypted channel; elsewhere a TLS
/// requirement also verifies the server certificate and host name.
pub fn ssl_mode(tls_required: bool, environment: Environment) -> PgSslMode {
    match (tls_required, environment) {
        (false, _) => PgSslMode::Disable,
        (true, Environment::Production) => PgSslMode::Require,
        (true, Environment::Development) => PgSslMode::VerifyFull,
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn initialize_schema(&self) -> StorageResult<()> {
        sqlx::query(schema::CREATE_USERS).execute(&self.pool).await?;
        sqlx::query(schema::CREATE_REQUESTS_LOG).execute(&self.pool).await?;
        Ok(())
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(schema::SELECT_USERS)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn create_user(&self, user: &NewUser) -> StorageResult<User> {
        let created = sqlx::query_as::<_, User>(schema::INSERT_USER)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.server_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn count_users(&self) -> StorageResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(schema::COUNT_USERS)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_requests(&self, server_id: &str) -> StorageResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(schema::COUNT_REQUESTS)
            .bind(server_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn recent_requests(
        &self,
        server_id: &str,
        window: Duration,
    ) -> StorageResult<Vec<EndpointCount>> {
        let rows = sqlx::query_as::<_, EndpointCount>(schema::RECENT_REQUESTS)
            .bind(server_id)
            .bind(window.as_secs_f64())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn log_request(&self, entry: &RequestLogEntry) -> StorageResult<()> {
        sqlx::query(schema::INSERT_REQUEST_LOG)
            .bind(&entry.server_id)
            .bind(&entry.endpoint)
            .bind(entry.ip_address.as_deref())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
