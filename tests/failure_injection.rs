//! Behavior of a replica whose database cannot be reached.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use replica_api::test_support::UnreachableStorage;

mod common;

async fn spawn_unreachable() -> (common::TestReplica, Arc<UnreachableStorage>) {
    let storage = Arc::new(UnreachableStorage::new());
    let replica = common::spawn_with(common::test_config("r1"), storage.clone()).await;
    (replica, storage)
}

#[tokio::test]
async fn test_startup_survives_unreachable_database() {
    let (replica, storage) = spawn_unreachable().await;

    let (status, health) = replica.get_json("/health").await;
    assert_eq!(status, 200);
    assert_eq!(health["status"], "healthy");

    let (status, info) = replica.get_json("/server-info").await;
    assert_eq!(status, 200);
    assert_eq!(info["server_id"], "r1");

    let (status, _) = replica.get_json("/").await;
    assert_eq!(status, 200);

    let attempted = common::eventually(Duration::from_secs(5), || {
        let storage = storage.clone();
        async move { storage.calls() >= 1 }
    })
    .await;
    assert!(attempted, "schema initialization was not attempted");
}

#[tokio::test]
async fn test_data_endpoints_report_storage_errors() {
    let (replica, _storage) = spawn_unreachable().await;

    let (status, err) = replica.get_json("/api/users").await;
    assert_eq!(status, 500);
    assert_eq!(err["server"], "r1");
    assert!(!err["error"].as_str().unwrap().is_empty());

    let (status, err) = replica.get_json("/api/stats").await;
    assert_eq!(status, 500);
    assert_eq!(err["server"], "r1");

    let (status, err) = replica
        .post_json("/api/users", json!({"name": "Ada", "email": "ada@example.com"}))
        .await;
    assert_eq!(status, 500);
    assert_eq!(err["server"], "r1");
}

#[tokio::test]
async fn test_failed_log_writes_do_not_affect_responses() {
    let (replica, storage) = spawn_unreachable().await;
    let before = storage.calls();

    for _ in 0..10 {
        assert_eq!(replica.get("/health").await.status(), 200);
    }

    // Each health check queues one log write, all of which fail.
    let attempted = common::eventually(Duration::from_secs(5), || {
        let storage = storage.clone();
        async move { storage.calls() >= before + 10 }
    })
    .await;
    assert!(attempted);
}

#[tokio::test]
async fn test_validation_precedes_storage() {
    let (replica, storage) = spawn_unreachable().await;
    let before = storage.calls();

    let (status, err) = replica.post_json("/api/users", json!({"name": "Ada"})).await;
    assert_eq!(status, 400);
    assert_eq!(err["error"], "Name and email are required");

    // Only the request log write may touch storage.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(storage.calls() <= before + 1);
}
