//! In-process storage doubles for exercising the HTTP surface without a
//! database. Compiled for unit tests and behind the `test-support` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::storage::{
    EndpointCount, NewUser, RequestLogEntry, Storage, StorageError, StorageResult, User,
};

/// Storage that keeps rows in memory and mimics the store's constraints.
#[derive(Default)]
pub struct MemoryStorage {
    users: Mutex<Vec<User>>,
    log: Mutex<Vec<(RequestLogEntry, DateTime<Utc>)>>,
    create_calls: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `create_user` reached storage.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of logged requests, oldest first.
    pub fn logged(&self) -> Vec<RequestLogEntry> {
        self.log
            .lock()
            .expect("log mutex poisoned")
            .iter()
            .map(|(entry, _)| entry.clone())
            .collect()
    }

    /// Insert a log entry with an explicit timestamp.
    pub fn push_log_at(&self, entry: RequestLogEntry, at: DateTime<Utc>) {
        self.log.lock().expect("log mutex poisoned").push((entry, at));
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn initialize_schema(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let mut users = self.users.lock().expect("users mutex poisoned").clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn create_user(&self, user: &NewUser) -> StorageResult<User> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().expect("users mutex poisoned");
        if users.iter().any(|u| u.email == user.email) {
            return Err(StorageError::from(sqlx::Error::Protocol(
                "duplicate key value violates unique constraint \"users_email_key\"".into(),
            )));
        }
        let created = User {
            id: users.len() as i32 + 1,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: Some(Utc::now()),
            server_id: Some(user.server_id.clone()),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn count_users(&self) -> StorageResult<i64> {
        Ok(self.users.lock().expect("users mutex poisoned").len() as i64)
    }

    async fn count_requests(&self, server_id: &str) -> StorageResult<i64> {
        let log = self.log.lock().expect("log mutex poisoned");
        Ok(log.iter().filter(|(e, _)| e.server_id == server_id).count() as i64)
    }

    async fn recent_requests(
        &self,
        server_id: &str,
        window: Duration,
    ) -> StorageResult<Vec<EndpointCount>> {
        let window = chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::days(3650));
        let cutoff = Utc::now() - window;
        let log = self.log.lock().expect("log mutex poisoned");

        let mut counts: Vec<EndpointCount> = Vec::new();
        for (entry, at) in log.iter() {
            if entry.server_id != server_id || *at <= cutoff {
                continue;
            }
            match counts.iter_mut().find(|c| c.endpoint == entry.endpoint) {
                Some(c) => c.count += 1,
                None => counts.push(EndpointCount {
                    endpoint: entry.endpoint.clone(),
                    count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.endpoint.cmp(&b.endpoint)));
        Ok(counts)
    }

    async fn log_request(&self, entry: &RequestLogEntry) -> StorageResult<()> {
        self.push_log_at(entry.clone(), Utc::now());
        Ok(())
    }
}

/// Storage whose every operation fails as if the database were unreachable.
#[derive(Default)]
pub struct UnreachableStorage {
    calls: AtomicUsize,
}

impl UnreachableStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> StorageResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::from(sqlx::Error::PoolTimedOut))
    }
}

#[async_trait]
impl Storage for UnreachableStorage {
    async fn initialize_schema(&self) -> StorageResult<()> {
        self.fail()
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        self.fail()
    }

    async fn create_user(&self, _user: &NewUser) -> StorageResult<User> {
        self.fail()
    }

    async fn count_users(&self) -> StorageResult<i64> {
        self.fail()
    }

    async fn count_requests(&self, _server_id: &str) -> StorageResult<i64> {
        self.fail()
    }

    async fn recent_requests(
        &self,
        _server_id: &str,
        _window: Duration,
    ) -> StorageResult<Vec<EndpointCount>> {
        self.fail()
    }

    async fn log_request(&self, _entry: &RequestLogEntry) -> StorageResult<()> {
        self.fail()
    }
}
