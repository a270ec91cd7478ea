//! Pending call queue.
//!
//! A FIFO ledger of ids that have been submitted but not yet claimed by a
//! worker. It carries no flow control; the worker pool and the admission
//! limiter do that. Invariant: `len() == submitted - claimed`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct PendingQueue {
    ids: Mutex<VecDeque<String>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section is a single VecDeque call, so a poisoned guard
    // still holds a consistent queue.
    fn ids(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.ids.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, call_id: impl Into<String>) {
        self.ids().push_back(call_id.into());
    }

    /// Remove the earliest occurrence of `call_id`. Returns `false` if it
    /// was not queued.
    pub fn claim(&self, call_id: &str) -> bool {
        let mut ids = self.ids();
        match ids.iter().position(|id| id == call_id) {
            Some(pos) => ids.remove(pos).is_some(),
            None => false,
        }
    }

    /// Ids in submission order.
    pub fn snapshot(&self) -> Vec<String> {
        self.ids().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_keeps_submission_order() {
        let queue = PendingQueue::new();
        for id in ["a", "b", "c"] {
            queue.push(id);
        }
        assert_eq!(queue.snapshot(), ["a", "b", "c"]);
    }

    #[test]
    fn claim_removes_own_id_not_front() {
        let queue = PendingQueue::new();
        queue.push("a");
        queue.push("b");
        queue.push("c");

        assert!(queue.claim("b"));
        assert_eq!(queue.snapshot(), ["a", "c"]);
        assert!(!queue.claim("b"));
    }

    #[test]
    fn duplicate_ids_are_claimed_one_at_a_time() {
        let queue = PendingQueue::new();
        queue.push("x");
        queue.push("x");
        assert!(queue.claim("x"));
        assert_eq!(queue.len(), 1);
        assert!(queue.claim("x"));
        assert!(queue.is_empty());
    }
}
