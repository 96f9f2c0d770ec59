//! Fire-and-forget request logging.
//!
//! Handlers never wait on the log write. Entries go into a bounded queue
//! and a detached worker task inserts them one by one; a failed insert is
//! reported and forgotten, a full queue drops the entry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::storage::{RequestLogEntry, Storage};

/// Cheap, cloneable handle used on the request path.
#[derive(Clone, Debug)]
pub struct RequestLogger {
    tx: Option<mpsc::Sender<RequestLogEntry>>,
}

impl RequestLogger {
    /// Create a logger and the worker that drains it.
    pub fn channel(storage: Arc<dyn Storage>, capacity: usize) -> (Self, RequestLogWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, RequestLogWorker { rx, storage })
    }

    /// A logger that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue an entry without waiting. Never fails the caller.
    pub fn record(&self, entry: RequestLogEntry) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(entry) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(entry)) => {
                tracing::warn!(endpoint = %entry.endpoint, "Request log queue full, dropping entry");
                metrics::record_log_dropped();
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => {
                tracing::debug!(endpoint = %entry.endpoint, "Request log closed, dropping entry");
                metrics::record_log_dropped();
            }
        }
    }
}

/// Background task that writes queued entries to storage.
pub struct RequestLogWorker {
    rx: mpsc::Receiver<RequestLogEntry>,
    storage: Arc<dyn Storage>,
}

impl RequestLogWorker {
    /// Run until every `RequestLogger` handle is dropped and the queue is empty.
    ///
    /// Returns the number of entries written.
    pub async fn run(mut self) -> u64 {
        tracing::debug!("Request log worker starting");
        let mut written = 0u64;

        while let Some(entry) = self.rx.recv().await {
            match self.storage.log_request(&entry).await {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        endpoint = %entry.endpoint,
                        "Failed to log request"
                    );
                    metrics::record_log_failure();
                }
            }
        }

        tracing::debug!(written, "Request log worker stopped");
        written
    }

    /// Detach the worker onto the runtime.
    pub fn spawn(self) -> JoinHandle<u64> {
        tokio::spawn(self.run())
    }
}

/// Wait for a worker to flush what is left, up to `grace`.
pub async fn drain(handle: JoinHandle<u64>, grace: Duration) {
    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(written)) => tracing::info!(written, "Request log drained"),
        Ok(Err(e)) => tracing::error!(error = %e, "Request log worker failed"),
        Err(_) => tracing::warn!(
            grace_secs = grace.as_secs(),
            "Request log drain timed out, pending entries discarded"
        ),
    }
}
