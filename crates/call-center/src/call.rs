//! Call unit: one call bound to one staff member, and its simulated handling.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use staffing::{Claim, StaffTier};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::DispatchError;

/// Inclusive range of simulated call durations, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl DurationRange {
    pub fn new(min_secs: u64, max_secs: u64) -> Result<Self, DispatchError> {
        if min_secs == 0 {
            return Err(DispatchError::config("minimum call duration must be positive"));
        }
        if max_secs < min_secs {
            return Err(DispatchError::config(format!(
                "maximum call duration {max_secs}s is below minimum {min_secs}s"
            )));
        }
        Ok(Self { min_secs, max_secs })
    }

    /// Uniform draw from `[min_secs, max_secs]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.gen_range(self.min_secs..=self.max_secs)
    }

    pub fn contains(&self, secs: u64) -> bool {
        (self.min_secs..=self.max_secs).contains(&secs)
    }
}

/// Summary of an answered call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReport {
    pub call_id: String,
    pub staff_id: String,
    pub tier: StaffTier,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A call being handled. The duration is fixed at construction.
///
/// Only the staff member's id and tier are copied in; the [`Claim`] itself
/// stays with whoever will release it.
#[derive(Debug, Clone)]
pub struct Call {
    call_id: String,
    duration_secs: u64,
    staff_id: String,
    tier: StaffTier,
}

impl Call {
    pub fn new(call_id: impl Into<String>, staff: &Claim, range: DurationRange) -> Self {
        Self::with_rng(call_id, staff, range, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        call_id: impl Into<String>,
        staff: &Claim,
        range: DurationRange,
        rng: &mut R,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            duration_secs: range.sample(rng),
            staff_id: staff.id.clone(),
            tier: staff.tier,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Hold the line for the call's duration.
    ///
    /// Returns [`DispatchError::Cancelled`] as soon as `cancel` fires; no
    /// report is produced for a cancelled call. Freeing the staff member is
    /// left to the caller.
    pub async fn handle(&self, cancel: &CancellationToken) -> Result<CallReport, DispatchError> {
        let started_at = Utc::now();
        info!(
            call_id = %self.call_id,
            staff_id = %self.staff_id,
            tier = %self.tier,
            duration_secs = self.duration_secs,
            "answering call"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(call_id = %self.call_id, staff_id = %self.staff_id, "call interrupted");
                Err(DispatchError::cancelled(&self.call_id))
            }
            _ = tokio::time::sleep(Duration::from_secs(self.duration_secs)) => {
                info!(
                    call_id = %self.call_id,
                    staff_id = %self.staff_id,
                    duration_secs = self.duration_secs,
                    "call answered"
                );
                Ok(CallReport {
                    call_id: self.call_id.clone(),
                    staff_id: self.staff_id.clone(),
                    tier: self.tier,
                    duration_secs: self.duration_secs,
                    started_at,
                    finished_at: Utc::now(),
                })
            }
        }
    }
}
