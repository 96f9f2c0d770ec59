//! `PgStorage` against a real PostgreSQL server.
//!
//! Runs only when `DATABASE_URL` points at a database the tests may create
//! tables in; otherwise every test returns early. Each test uses its own
//! replica id and e-mail addresses, so runs can share one database.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use replica_api::storage::{NewUser, PgStorage, RequestLogEntry, Storage};

async fn storage() -> Option<PgStorage> {
    let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty());
    let Some(url) = url else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&url)
        .await
        .expect("DATABASE_URL is set but unreachable");
    let storage = PgStorage::from_pool(pool);
    // Concurrent first-time CREATE TABLE IF NOT EXISTS can collide; the
    // second attempt sees the tables.
    if storage.initialize_schema().await.is_err() {
        storage.initialize_schema().await.expect("schema creation failed");
    }
    Some(storage)
}

fn unique_server() -> String {
    format!("t-{}", Uuid::new_v4().simple())
}

fn new_user(name: &str, server_id: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: format!("{}@example.com", Uuid::new_v4().simple()),
        server_id: server_id.to_string(),
    }
}

#[tokio::test]
async fn test_schema_creation_is_idempotent() {
    let Some(storage) = storage().await else { return };
    storage.initialize_schema().await.unwrap();
    storage.initialize_schema().await.unwrap();
}

#[tokio::test]
async fn test_created_row_comes_back_complete() {
    let Some(storage) = storage().await else { return };
    let server = unique_server();
    let input = new_user("Ada", &server);

    let user = storage.create_user(&input).await.unwrap();
    assert!(user.id > 0);
    assert_eq!(user.name, "Ada");
    assert_eq!(user.email, input.email);
    assert_eq!(user.server_id.as_deref(), Some(server.as_str()));
    assert!(user.created_at.is_some());

    let listed = storage.list_users().await.unwrap();
    assert_eq!(listed.iter().filter(|u| u.email == input.email).count(), 1);
}

#[tokio::test]
async fn test_users_listed_newest_first() {
    let Some(storage) = storage().await else { return };
    let server = unique_server();

    let first = storage.create_user(&new_user("first", &server)).await.unwrap();
    let second = storage.create_user(&new_user("second", &server)).await.unwrap();

    let listed = storage.list_users().await.unwrap();
    let pos = |id: i32| listed.iter().position(|u| u.id == id).unwrap();
    assert!(pos(second.id) < pos(first.id));
}

#[tokio::test]
async fn test_duplicate_email_reports_constraint() {
    let Some(storage) = storage().await else { return };
    let server = unique_server();
    let user = new_user("Ada", &server);

    storage.create_user(&user).await.unwrap();
    let before = storage.count_users().await.unwrap();

    let err = storage.create_user(&user).await.unwrap_err();
    assert!(err.detail().contains("duplicate key"), "{}", err.detail());
    assert_eq!(storage.count_users().await.unwrap(), before);
}

#[tokio::test]
async fn test_request_counts_and_window() {
    let Some(storage) = storage().await else { return };
    let server = unique_server();

    for endpoint in ["/health", "/health", "/api/users"] {
        storage
            .log_request(&RequestLogEntry::new(&server, endpoint, Some("10.0.0.1".into())))
            .await
            .unwrap();
    }
    sqlx::query(
        "INSERT INTO requests_log (server_id, endpoint, timestamp) \
         VALUES ($1, '/archived', NOW() - INTERVAL '2 hours')",
    )
    .bind(&server)
    .execute(storage.pool())
    .await
    .unwrap();

    assert_eq!(storage.count_requests(&server).await.unwrap(), 4);

    let recent = storage
        .recent_requests(&server, Duration::from_secs(3600))
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].endpoint, "/health");
    assert_eq!(recent[0].count, 2);
    assert_eq!(recent[1].endpoint, "/api/users");
    assert_eq!(recent[1].count, 1);

    let wide = storage
        .recent_requests(&server, Duration::from_secs(3 * 3600))
        .await
        .unwrap();
    assert!(wide.iter().any(|r| r.endpoint == "/archived"));
}

#[tokio::test]
async fn test_other_replicas_are_not_counted() {
    let Some(storage) = storage().await else { return };
    let mine = unique_server();
    let theirs = unique_server();

    storage
        .log_request(&RequestLogEntry::new(&theirs, "/health", None))
        .await
        .unwrap();

    assert_eq!(storage.count_requests(&mine).await.unwrap(), 0);
    assert!(storage
        .recent_requests(&mine, Duration::from_secs(3600))
        .await
        .unwrap()
        .is_empty());
}
