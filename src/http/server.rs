//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, CORS, limits, logging)
//! - Bind server to listener
//! - Stop accepting on shutdown and let in-flight requests finish

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api;
use crate::config::AppConfig;
use crate::diagnostics::{self, SystemProbe};
use crate::http::{request, response};
use crate::identity::ReplicaId;
use crate::observability::metrics;
use crate::request_log::{self, RequestLogger};
use crate::storage::Storage;

/// Application state injected into handlers.
///
/// Everything here is immutable after startup apart from what the storage
/// pool and the log queue manage internally.
#[derive(Clone)]
pub struct AppState {
    pub replica: ReplicaId,
    pub storage: Arc<dyn Storage>,
    pub request_log: RequestLogger,
    pub system: Arc<SystemProbe>,
    pub started_at: Instant,
    pub stats_window: Duration,
    pub trust_proxy: bool,
    pub security_headers: bool,
}

impl AppState {
    pub fn new(replica: ReplicaId, storage: Arc<dyn Storage>, request_log: RequestLogger) -> Self {
        Self {
            replica,
            storage,
            request_log,
            system: Arc::new(SystemProbe::new()),
            started_at: Instant::now(),
            stats_window: Duration::from_secs(3600),
            trust_proxy: false,
            security_headers: true,
        }
    }

    /// Take the tunables from configuration.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.stats_window = Duration::from_secs(config.stats.recent_window_secs);
        self.trust_proxy = config.listener.trust_proxy;
        self.security_headers = config.security.enable_headers;
        self
    }

    /// Count uptime from `started_at` instead of construction time.
    pub fn with_started_at(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }
}

/// HTTP server for one replica.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let cors = if config.security.cors_enabled {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
        };

        // Outermost first.
        let layers = ServiceBuilder::new()
            .layer(request::set_request_id_layer())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request<Body>| request::request_span(req)),
            )
            .layer(request::propagate_request_id_layer())
            .layer(cors)
            .layer(middleware::from_fn_with_state(state.clone(), response::annotate))
            .layer(middleware::from_fn_with_state(state.clone(), request_log::record_request))
            .layer(DefaultBodyLimit::max(config.security.max_body_size));

        Router::new()
            .route("/", get(diagnostics::index))
            .route("/health", get(diagnostics::health))
            .route("/server-info", get(diagnostics::server_info))
            .nest("/api", api::router())
            .route_layer(middleware::from_fn(metrics::track_requests))
            .fallback(response::not_found)
            .layer(layers)
            .with_state(state)
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
