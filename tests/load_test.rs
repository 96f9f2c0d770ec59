//! Several replicas sharing one store, driven the way a round-robin
//! balancer would drive them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use replica_api::test_support::MemoryStorage;

mod common;

#[tokio::test]
async fn test_replicas_share_users_but_not_request_counts() {
    let storage = Arc::new(MemoryStorage::new());
    let r1 = common::spawn_with(common::test_config("r1"), storage.clone()).await;
    let r2 = common::spawn_with(common::test_config("r2"), storage.clone()).await;

    let (status, created) = r1
        .post_json("/api/users", json!({"name": "Ada", "email": "ada@example.com"}))
        .await;
    assert_eq!(status, 201);
    assert_eq!(created["user"]["server_id"], "r1");

    let (_, list) = r2.get_json("/api/users").await;
    assert_eq!(list["server"], "r2");
    assert_eq!(list["total"], 1);
    assert_eq!(list["users"][0]["server_id"], "r1");

    for _ in 0..3 {
        r2.get("/health").await;
    }

    common::eventually(Duration::from_secs(5), || {
        let storage = storage.clone();
        async move { storage.logged().len() >= 5 }
    })
    .await;

    let (_, s1) = r1.get_json("/api/stats").await;
    let (_, s2) = r2.get_json("/api/stats").await;
    assert_eq!(s1["total_users"], 1);
    assert_eq!(s2["total_users"], 1);
    // The stats request itself may already be logged.
    let r1_handled = s1["requests_handled"].as_i64().unwrap();
    assert!((1..=2).contains(&r1_handled));
    assert!(s2["requests_handled"].as_i64().unwrap() >= 4);
}

#[tokio::test]
async fn test_round_robin_distribution() {
    let storage = Arc::new(MemoryStorage::new());
    let replicas = vec![
        common::spawn_with(common::test_config("r1"), storage.clone()).await,
        common::spawn_with(common::test_config("r2"), storage.clone()).await,
        common::spawn_with(common::test_config("r3"), storage.clone()).await,
    ];

    let total = 30;
    let mut tally: HashMap<String, usize> = HashMap::new();
    for i in 0..total {
        let (status, health) = replicas[i % replicas.len()].get_json("/health").await;
        assert_eq!(status, 200);
        *tally
            .entry(health["server"].as_str().unwrap().to_string())
            .or_default() += 1;
    }

    assert_eq!(tally.len(), 3);
    assert!(tally.values().all(|&hits| hits == total / 3));
}

#[tokio::test]
async fn test_concurrent_creates() {
    let (replica, storage) = common::spawn_replica("r1").await;
    let replica = Arc::new(replica);

    let mut tasks = Vec::new();
    for i in 0..20 {
        let replica = replica.clone();
        tasks.push(tokio::spawn(async move {
            replica
                .post_json(
                    "/api/users",
                    json!({"name": format!("user{}", i), "email": format!("user{}@example.com", i)}),
                )
                .await
                .0
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), 201);
    }
    assert_eq!(storage.create_calls(), 20);

    let (_, list) = replica.get_json("/api/users").await;
    assert_eq!(list["total"], 20);
}
