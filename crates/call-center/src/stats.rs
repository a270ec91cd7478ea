//! Dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Lock-free counters shared by every worker.
#[derive(Debug, Default)]
pub struct DispatchStats {
    submitted: AtomicU64,
    answered: AtomicU64,
    cancelled: AtomicU64,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`] plus queue and roster gauges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSnapshot {
    pub submitted: u64,
    pub answered: u64,
    pub cancelled: u64,
    pub in_flight: u64,
    pub peak_in_flight: u64,
    pub pending: usize,
    pub staff_busy: usize,
    pub staff_available: usize,
    pub admission_permits_available: usize,
}

impl DispatchStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// A staff member was claimed for a call.
    pub(crate) fn enter_call(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
    }

    /// The claimed staff member was released.
    pub(crate) fn leave_call(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn record_answered(&self) {
        self.answered.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn answered(&self) -> u64 {
        self.answered.load(Ordering::Acquire)
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest `in_flight` ever observed.
    pub fn peak_in_flight(&self) -> u64 {
        self.peak_in_flight.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_tracks_high_water_mark() {
        let stats = DispatchStats::default();
        stats.enter_call();
        stats.enter_call();
        stats.leave_call();
        stats.enter_call();
        stats.leave_call();
        stats.leave_call();
        assert_eq!(stats.in_flight(), 0);
        assert_eq!(stats.peak_in_flight(), 2);
    }

    #[test]
    fn counters_are_independent() {
        let stats = DispatchStats::default();
        stats.record_submitted();
        stats.record_submitted();
        stats.record_answered();
        stats.record_cancelled();
        assert_eq!(
            (stats.submitted(), stats.answered(), stats.cancelled()),
            (2, 1, 1)
        );
    }
}
