//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency by method, route
//! - `request_log_dropped_total` (counter): entries dropped before storage
//! - `request_log_failures_total` (counter): failed log inserts
//!
//! # Design Decisions
//! - Routes are labelled by their matched pattern to bound cardinality
//! - Exporter is optional; recording without one is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// A request log entry was discarded before reaching storage.
pub fn record_log_dropped() {
    metrics::counter!("request_log_dropped_total").increment(1);
}

/// A request log insert failed.
pub fn record_log_failure() {
    metrics::counter!("request_log_failures_total").increment(1);
}

/// Middleware recording count and latency of every routed request.
///
/// Must be installed with `route_layer` so the matched path is known.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start);
    response
}
