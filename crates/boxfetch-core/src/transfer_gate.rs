//! Bound on simultaneous local transfers.
//!
//! Each transfer holds a `TransferSlot` for its whole streaming phase; dropping the
//! slot (on success, error or cancellation) frees it for the next waiter.

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone)]
pub struct TransferGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    active: Arc<AtomicUsize>,
}

impl TransferGate {
    /// Gate with `capacity` slots (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Transfers currently holding a slot.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> Result<TransferSlot> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| anyhow::anyhow!("transfer gate closed"))?;
        self.active.fetch_add(1, Ordering::AcqRel);
        Ok(TransferSlot {
            _permit: permit,
            active: Arc::clone(&self.active),
        })
    }
}

/// Held while a transfer streams. Releases its slot on drop.
#[derive(Debug)]
pub struct TransferSlot {
    _permit: OwnedSemaphorePermit,
    active: Arc<AtomicUsize>,
}

impl Drop for TransferSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}
