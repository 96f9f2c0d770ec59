//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the replica identity
//! - Ensure the schema exists (detached, non-fatal)
//! - Start the request log worker
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Storage is connected lazily and schema creation runs in the background,
//!   so an unreachable database never delays the listener
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::http::{AppState, HttpServer};
use crate::identity::ReplicaId;
use crate::request_log::{self, RequestLogger};
use crate::storage::Storage;

/// A replica that has finished startup and is ready to serve.
pub struct Application {
    replica: ReplicaId,
    listener: TcpListener,
    server: HttpServer,
    log_worker: Option<JoinHandle<u64>>,
    drain_timeout: Duration,
}

impl Application {
    /// Run every startup step against `storage` and bind the listener.
    ///
    /// Uptime is counted from the moment of the call.
    pub async fn build(config: AppConfig, storage: Arc<dyn Storage>) -> std::io::Result<Self> {
        Self::build_at(config, storage, Instant::now()).await
    }

    /// Like [`Application::build`], with uptime counted from `started_at`.
    pub async fn build_at(
        config: AppConfig,
        storage: Arc<dyn Storage>,
        started_at: Instant,
    ) -> std::io::Result<Self> {
        let replica = ReplicaId::resolve(config.server_id.as_deref());
        tracing::info!(server = %replica, environment = %config.environment, "Starting replica");

        tokio::spawn(initialize_schema(storage.clone()));

        let (request_log, log_worker) = if config.request_log.enabled {
            let (logger, worker) =
                RequestLogger::channel(storage.clone(), config.request_log.queue_capacity);
            (logger, Some(worker.spawn()))
        } else {
            tracing::info!("Request logging disabled");
            (RequestLogger::disabled(), None)
        };

        let state = AppState::new(replica.clone(), storage, request_log)
            .with_config(&config)
            .with_started_at(started_at);

        let listener = TcpListener::bind(config.listener.bind_address()).await?;
        tracing::info!(address = %listener.local_addr()?, "Listening for connections");

        let drain_timeout = Duration::from_secs(config.request_log.drain_timeout_secs);
        let server = HttpServer::new(config, state);

        Ok(Self {
            replica,
            listener,
            server,
            log_worker,
            drain_timeout,
        })
    }

    /// Address actually bound, useful when the configured port is 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn replica(&self) -> &ReplicaId {
        &self.replica
    }

    /// Serve until shutdown, then flush the request log.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let Self {
            listener,
            server,
            log_worker,
            drain_timeout,
            ..
        } = self;

        // Serving consumes the router and with it the last logger handles,
        // which lets the worker run to completion.
        let result = server.run(listener, shutdown).await;

        if let Some(handle) = log_worker {
            request_log::drain(handle, drain_timeout).await;
        }

        result
    }
}

/// Create the tables if needed. Failure is logged and never retried.
pub async fn initialize_schema(storage: Arc<dyn Storage>) {
    match storage.initialize_schema().await {
        Ok(()) => tracing::info!("Database schema initialized"),
        Err(e) => tracing::error!(
            error = %e,
            "Failed to initialize database schema, continuing without it"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::storage::PgStorage;
    use crate::test_support::{MemoryStorage, UnreachableStorage};

    fn local_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server_id = Some("r1".into());
        config.listener.host = "127.0.0.1".into();
        config.listener.port = 0;
        config
    }

    #[tokio::test]
    async fn test_build_binds_ephemeral_port() {
        let app = Application::build(local_config(), Arc::new(MemoryStorage::new()))
            .await
            .unwrap();
        assert_ne!(app.local_addr().unwrap().port(), 0);
        assert_eq!(app.replica().as_str(), "r1");
    }

    #[tokio::test]
    async fn test_build_survives_unreachable_storage() {
        let storage = Arc::new(UnreachableStorage::new());
        let app = Application::build(local_config(), storage.clone()).await;
        assert!(app.is_ok());

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while storage.calls() == 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(storage.calls(), 1);
    }

    #[tokio::test]
    async fn test_build_does_not_wait_for_database() {
        let mut db = crate::config::DatabaseConfig::default();
        db.host = "127.0.0.1".into();
        db.port = 1;
        db.acquire_timeout_secs = 5;
        let storage = Arc::new(PgStorage::connect_lazy(&db, false, Environment::Development));

        let start = Instant::now();
        let app = Application::build(local_config(), storage).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1), "build took {:?}", start.elapsed());

        let conn = tokio::net::TcpStream::connect(app.local_addr().unwrap()).await;
        assert!(conn.is_ok());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let app = Application::build(local_config(), Arc::new(MemoryStorage::new()))
            .await
            .unwrap();
        let shutdown = crate::lifecycle::Shutdown::new();
        let rx = shutdown.subscribe();
        let handle = tokio::spawn(app.run(rx));

        shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
