//! Shutdown fan-out.
//!
//! One trigger, many listeners: the HTTP server stops accepting, and the
//! request log drains once the server has let go of its queue.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::lifecycle::signals;

/// Broadcasts a single stop notice to every subscribed task.
#[derive(Clone)]
pub struct Shutdown {
    notify: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self { notify }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Notify every subscriber. A no-op when nobody is listening.
    pub fn trigger(&self) {
        if self.notify.send(()).is_err() {
            tracing::debug!("Shutdown triggered with no listeners");
        }
    }

    /// Trigger once the process receives SIGINT or SIGTERM.
    pub fn trigger_on_signal(&self) -> JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            signals::wait_for_signal().await;
            tracing::info!("Starting graceful shutdown");
            shutdown.trigger();
        })
    }

    /// Tasks still subscribed.
    pub fn receiver_count(&self) -> usize {
        self.notify.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
