//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use replica_api::config::AppConfig;
use replica_api::lifecycle::{Application, Shutdown};
use replica_api::storage::Storage;
use replica_api::test_support::MemoryStorage;

/// A replica running on an ephemeral port.
pub struct TestReplica {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestReplica {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("replica unreachable")
    }

    pub async fn get_json(&self, path: &str) -> (u16, serde_json::Value) {
        let res = self.get(path).await;
        let status = res.status().as_u16();
        (status, res.json().await.expect("body is not JSON"))
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
        let res = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("replica unreachable");
        let status = res.status().as_u16();
        (status, res.json().await.expect("body is not JSON"))
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

impl Drop for TestReplica {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn test_config(server_id: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.server_id = Some(server_id.to_string());
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config
}

/// Start a replica over the given storage.
pub async fn spawn_with(config: AppConfig, storage: Arc<dyn Storage>) -> TestReplica {
    let app = Application::build(config, storage)
        .await
        .expect("replica failed to start");
    let addr = app.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = app.run(rx).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    TestReplica {
        addr,
        client,
        shutdown,
    }
}

/// Start replica `server_id` over fresh in-memory storage.
pub async fn spawn_replica(server_id: &str) -> (TestReplica, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let replica = spawn_with(test_config(server_id), storage.clone()).await;
    (replica, storage)
}

/// Poll `check` until it holds or the timeout elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
