//! Request logging middleware.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;
use crate::storage::RequestLogEntry;

/// Queue a log entry for the request, then continue down the chain.
///
/// Runs before routing so every request is recorded, whichever handler
/// (or fallback) ends up serving it.
pub async fn record_request(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let endpoint = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| request.uri().path());

    let entry = RequestLogEntry::new(
        state.replica.as_str(),
        endpoint,
        client_address(&request, state.trust_proxy),
    );
    state.request_log.record(entry);

    next.run(request).await
}

/// Client address for the request.
///
/// With `trust_proxy`, the first `X-Forwarded-For` hop is preferred over the
/// peer address (which is the balancer's).
pub fn client_address(request: &Request<Body>, trust_proxy: bool) -> Option<String> {
    if trust_proxy {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = forwarded {
            return Some(addr.to_string());
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}
