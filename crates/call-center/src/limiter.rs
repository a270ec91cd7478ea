//! Admission limiter: counting permits bounding calls in active handling.
//!
//! Backed by tokio's semaphore, which queues waiters FIFO, so every waiter
//! acquires a permit eventually as permits are released.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::errors::DispatchError;

/// Held for the whole claim → handle → release section. Dropping it returns
/// the permit, so an acquisition is always paired with exactly one release.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug, Clone)]
pub struct AdmissionLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionLimiter {
    pub fn new(capacity: usize) -> Result<Self, DispatchError> {
        if capacity == 0 {
            return Err(DispatchError::config("admission permits must be positive"));
        }
        Ok(Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait for a permit. Fails with `Cancelled` once the limiter is closed.
    pub async fn acquire(&self, call_id: &str) -> Result<AdmissionPermit, DispatchError> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map(|permit| AdmissionPermit { _permit: permit })
            .map_err(|_| DispatchError::cancelled(call_id))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wake every parked waiter with `Cancelled`; held permits stay valid.
    pub fn close(&self) {
        self.permits.close();
    }
}
