use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::types::{CreateUser, CreatedUser, ErrorBody, Health, Index, ServerInfo, Stats, UserList};

/// Header every replica stamps on its responses.
pub const SERVED_BY: &str = "x-served-by";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{server} returned {status}: {message}")]
    Api {
        status: StatusCode,
        server: String,
        message: String,
    },

    #[error("unexpected {status} response: {body}")]
    Unexpected { status: StatusCode, body: String },
}

/// A decoded body together with the replica that produced it.
#[derive(Debug, Clone)]
pub struct Served<T> {
    pub served_by: Option<String>,
    pub body: T,
}

pub struct ReplicaClient {
    client: Client,
    base_url: String,
}

impl ReplicaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<Served<Health>, ClientError> {
        self.get("/health").await
    }

    pub async fn server_info(&self) -> Result<Served<ServerInfo>, ClientError> {
        self.get("/server-info").await
    }

    pub async fn index(&self) -> Result<Served<Index>, ClientError> {
        self.get("/").await
    }

    pub async fn list_users(&self) -> Result<Served<UserList>, ClientError> {
        self.get("/api/users").await
    }

    /// Create a user on whichever replica answers.
    pub async fn create_user(&self, name: &str, email: &str) -> Result<Served<CreatedUser>, ClientError> {
        let body = CreateUser {
            name: name.to_string(),
            email: email.to_string(),
        };
        let resp = self
            .client
            .post(format!("{}/api/users", self.base_url))
            .json(&body)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn stats(&self) -> Result<Served<Stats>, ClientError> {
        self.get("/api/stats").await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Served<T>, ClientError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<Served<T>, ClientError> {
    let status = resp.status();
    let served_by = resp
        .headers()
        .get(SERVED_BY)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorBody>(&text) {
            Ok(err) => ClientError::Api {
                status,
                server: err.server,
                message: err.error,
            },
            Err(_) => ClientError::Unexpected { status, body: text },
        });
    }

    match serde_json::from_str::<T>(&text) {
        Ok(body) => Ok(Served { served_by, body }),
        Err(_) => Err(ClientError::Unexpected { status, body: text }),
    }
}
