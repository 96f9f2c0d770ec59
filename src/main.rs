//! Replica backend (v1)
//!
//! One of several identical instances placed behind a load balancer. Every
//! response names the replica that produced it.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────┐
//!                         │                   REPLICA                       │
//!     Client Request      │  ┌──────────┐    ┌────────────┐                 │
//!     ────────────────────┼─▶│   http   │───▶│ diagnostics│ /health, /      │
//!                         │  │  server  │    │            │ /server-info    │
//!                         │  └────┬─────┘    └────────────┘                 │
//!                         │       │          ┌────────────┐   ┌─────────┐   │
//!                         │       ├─────────▶│    api     │──▶│ storage │───┼──▶ Postgres
//!                         │       │          │users, stats│   │ gateway │   │
//!                         │       │          └────────────┘   └────▲────┘   │
//!                         │       │          ┌────────────┐        │        │
//!                         │       └─────────▶│request_log │────────┘        │
//!                         │                  │ (detached) │                 │
//!                         │                  └────────────┘                 │
//!                         │  config · identity · observability · lifecycle  │
//!                         └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;

use replica_api::config::load_from_sources;
use replica_api::lifecycle::{Application, Shutdown};
use replica_api::observability::{logging, metrics};
use replica_api::storage::PgStorage;

#[derive(Parser)]
#[command(name = "replica-api")]
#[command(about = "Replica backend for the load balancer demo", long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long, env = "APP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let started_at = Instant::now();
    let args = Args::parse();

    // Logging is not up yet, so configuration errors go to stderr.
    let config = load_from_sources(args.config.as_deref()).inspect_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
    })?;

    logging::init_logging(&config.observability.log_level, config.log_format())?;

    tracing::info!("replica-api v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = %config.environment,
        bind_address = %config.listener.bind_address(),
        database_host = %config.database.host,
        database_name = %config.database.name,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let storage = Arc::new(PgStorage::connect_lazy(
        &config.database,
        config.database_tls_required(),
        config.environment,
    ));

    let app = Application::build_at(config, storage.clone(), started_at).await?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    shutdown.trigger_on_signal();

    app.run(shutdown_rx).await?;
    storage.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
