//! Resource API mounted under `/api`.
//!
//! # Endpoints
//! - `GET  /api/users`: every user, newest first
//! - `POST /api/users`: create a user stamped with this replica's id
//! - `GET  /api/stats`: user and request counts for this replica

pub mod error;
pub mod stats;
pub mod users;

use axum::{routing::get, Router};

use crate::http::server::AppState;

pub use error::{ApiError, ApiErrorKind};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/stats", get(stats::stats))
}
