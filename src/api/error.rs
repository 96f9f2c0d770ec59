//! API error responses.
//!
//! Every error body is `{"error": <message>, "server": <replica id>}` so a
//! failure can be attributed to the replica that produced it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::identity::ReplicaId;
use crate::storage::StorageError;

/// What went wrong.
#[derive(Debug, thiserror::Error)]
pub enum ApiErrorKind {
    /// Missing or malformed input, caught before touching storage.
    #[error("{0}")]
    Validation(String),

    /// Any failure reported by the store, passed through verbatim.
    #[error("{}", .0.detail())]
    Storage(#[source] StorageError),

    /// Request body over the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Not found")]
    NotFound,
}

/// An error response attributed to a replica.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct ApiError {
    server: ReplicaId,
    #[source]
    kind: ApiErrorKind,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    server: &'a ReplicaId,
}

impl ApiError {
    pub fn validation(server: &ReplicaId, message: impl Into<String>) -> Self {
        Self {
            server: server.clone(),
            kind: ApiErrorKind::Validation(message.into()),
        }
    }

    pub fn storage(server: &ReplicaId, err: StorageError) -> Self {
        tracing::error!(server = %server, error = %err, "Storage operation failed");
        Self {
            server: server.clone(),
            kind: ApiErrorKind::Storage(err),
        }
    }

    pub fn payload_too_large(server: &ReplicaId, message: impl Into<String>) -> Self {
        Self {
            server: server.clone(),
            kind: ApiErrorKind::PayloadTooLarge(message.into()),
        }
    }

    pub fn not_found(server: &ReplicaId) -> Self {
        Self {
            server: server.clone(),
            kind: ApiErrorKind::NotFound,
        }
    }

    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ApiErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
            ApiErrorKind::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorKind::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind.to_string(),
            server: &self.server,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_is_bad_request() {
        let server = ReplicaId::new("r1");
        let (status, body) = body_json(ApiError::validation(&server, "Name and email are required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Name and email are required");
        assert_eq!(body["server"], "r1");
    }

    #[tokio::test]
    async fn test_storage_error_passes_message_through() {
        let server = ReplicaId::new("r2");
        let err = StorageError::from(sqlx::Error::PoolTimedOut);
        let expected = err.detail();

        let (status, body) = body_json(ApiError::storage(&server, err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], expected.as_str());
        assert_eq!(body["server"], "r2");
    }

    #[tokio::test]
    async fn test_payload_too_large() {
        let err = ApiError::payload_too_large(&ReplicaId::new("r1"), "length limit exceeded");
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "length limit exceeded");
        assert_eq!(body["server"], "r1");
    }

    #[tokio::test]
    async fn test_not_found() {
        let (status, body) = body_json(ApiError::not_found(&ReplicaId::new("r1"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }
}
