//! Shutdown signalling between the worker, its idle sleeps, and running transfers.
//!
//! `stop()` flips a shared flag that the streaming loop checks once per chunk and
//! wakes whichever sleep is pending so the scheduler notices promptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopping: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Sleeps for `duration` or until `stop()`. Returns false when stopping.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_stopping() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.wake.notified() => {}
        }
        !self.is_stopping()
    }
}
