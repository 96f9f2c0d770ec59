//! Response annotation.
//!
//! # Responsibilities
//! - Stamp every response with the replica that served it (`x-served-by`)
//! - Add security response headers (optional)
//! - JSON 404 for unknown routes
//! - Timestamps in the wire format used by every body

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::{SecondsFormat, Utc};

use crate::api::ApiError;
use crate::http::server::AppState;

/// Header naming the replica that produced the response.
pub const X_SERVED_BY: HeaderName = HeaderName::from_static("x-served-by");

const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::STRICT_TRANSPORT_SECURITY, "max-age=15552000; includeSubDomains"),
    (header::X_XSS_PROTECTION, "0"),
];

/// Current time as RFC 3339 UTC with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Add identity and security headers to the response.
pub async fn annotate(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(state.replica.as_str()) {
        headers.insert(X_SERVED_BY, value);
    }

    if state.security_headers {
        for (name, value) in SECURITY_HEADERS {
            if !headers.contains_key(&name) {
                headers.insert(name, HeaderValue::from_static(value));
            }
        }
    }

    response
}

/// Fallback for unknown routes.
pub async fn not_found(State(state): State<AppState>) -> ApiError {
    ApiError::not_found(&state.replica)
}
