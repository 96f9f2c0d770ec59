//! `users` resource handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::http::server::AppState;
use crate::identity::ReplicaId;
use crate::storage::{NewUser, User};

pub const MISSING_FIELDS: &str = "Name and email are required";

/// Body of `GET /api/users`.
#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
    pub server: ReplicaId,
    pub total: usize,
}

/// Body of `POST /api/users`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Body of a successful `POST /api/users`.
#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub user: User,
    pub server: ReplicaId,
    pub message: &'static str,
}

/// List every user, newest first.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserList>, ApiError> {
    let users = state
        .storage
        .list_users()
        .await
        .map_err(|e| ApiError::storage(&state.replica, e))?;

    Ok(Json(UserList {
        total: users.len(),
        users,
        server: state.replica.clone(),
    }))
}

/// Create a user stamped with this replica's id.
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedUser>), ApiError> {
    let Json(request) = payload.map_err(|rejection| reject_body(&state.replica, rejection))?;

    let new_user = validate(request, &state.replica)?;
    let user = state
        .storage
        .create_user(&new_user)
        .await
        .map_err(|e| ApiError::storage(&state.replica, e))?;

    tracing::info!(user_id = user.id, server = %state.replica, "User created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedUser {
            user,
            server: state.replica.clone(),
            message: "User created successfully",
        }),
    ))
}

/// Oversized bodies keep their 413; every other unreadable body is a 400.
fn reject_body(server: &ReplicaId, rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected create-user body");
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(server, rejection.body_text())
    } else {
        ApiError::validation(server, rejection.body_text())
    }
}

/// Both fields must be present and non-empty.
fn validate(request: CreateUserRequest, server: &ReplicaId) -> Result<NewUser, ApiError> {
    let present = |v: Option<String>| v.filter(|s| !s.is_empty());
    match (present(request.name), present(request.email)) {
        (Some(name), Some(email)) => Ok(NewUser {
            name,
            email,
            server_id: server.as_str().to_string(),
        }),
        _ => Err(ApiError::validation(server, MISSING_FIELDS)),
    }
}
