//! Dispatcher: accepts calls, admits them under two independent bounds,
//! and assigns each one to the least-senior free staff member.
//!
//! ## Per-call pipeline
//!
//! ```text
//! dispatch(id)                          (caller: never blocks)
//!   → queue.push(id) → spawn worker
//!
//! worker
//!   → pool slot        (max_concurrent_calls, held until the worker exits)
//!   → admission permit (admission_permits)
//!   → queue.claim(id)
//!   → staff claim      (tiered scan; wait on "staff freed" or backoff)
//!   → Call::handle     (simulated duration)
//!   → release staff → answered += 1 → release permit → release slot
//! ```
//!
//! Only the roster scan and the queue update take a lock; neither lock is
//! held across an await point.
//!
//! ## Shutdown
//!
//! - [`Dispatcher::stop_and_drain`] refuses new calls and waits for every
//!   accepted call to finish naturally.
//! - [`Dispatcher::cancel_now`] refuses new calls and interrupts every worker
//!   at whichever suspension point it is parked; held permits and staff
//!   claims are released on the way out and the call is counted as
//!   cancelled, never answered.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, RwLock};

use staffing::{Claim, Roster, StaffMember};
use tokio::runtime::Handle;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::call::{Call, CallReport};
use crate::config::{CallCenterConfig, DispatchSettings};
use crate::errors::DispatchError;
use crate::limiter::{AdmissionLimiter, AdmissionPermit};
use crate::queue::PendingQueue;
use crate::stats::{DispatchSnapshot, DispatchStats};

// ── Shared state ─────────────────────────────────────────────────────────────

/// Roster and admission limit, fixed by `configure`.
struct Staffing {
    roster: Mutex<Roster>,
    /// Signalled once per staff release.
    freed: Notify,
    limiter: AdmissionLimiter,
}

impl Staffing {
    // Claim and release each mutate the roster in one step, so a poisoned
    // guard never exposes a half-applied change.
    fn roster(&self) -> MutexGuard<'_, Roster> {
        self.roster.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// State every worker touches.
#[derive(Default)]
struct Floor {
    queue: PendingQueue,
    stats: DispatchStats,
    staffing: OnceLock<Staffing>,
}

impl Floor {
    fn staffing(&self) -> Result<&Staffing, DispatchError> {
        self.staffing
            .get()
            .ok_or_else(|| DispatchError::config("dispatcher used before configure"))
    }
}

/// Releases the staff member when dropped, whether the call finished or was
/// interrupted.
struct StaffGuard<'a> {
    floor: &'a Floor,
    staffing: &'a Staffing,
    claim: Claim,
}

impl<'a> StaffGuard<'a> {
    fn new(floor: &'a Floor, staffing: &'a Staffing, claim: Claim) -> Self {
        floor.stats.enter_call();
        Self {
            floor,
            staffing,
            claim,
        }
    }
}

impl Drop for StaffGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.staffing.roster().release(&self.claim) {
            error!(staff_id = %self.claim.id, error = %e, "staff release rejected");
        }
        self.floor.stats.leave_call();
        self.staffing.freed.notify_one();
    }
}

// ── Worker ───────────────────────────────────────────────────────────────────

struct Worker {
    floor: Arc<Floor>,
    pool: Arc<Semaphore>,
    settings: DispatchSettings,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self, call_id: String) {
        match self.answer(&call_id).await {
            Ok(report) => debug!(
                call_id = %report.call_id,
                staff_id = %report.staff_id,
                tier = %report.tier,
                "worker finished"
            ),
            Err(e) if e.kind().is_recovered_locally() => {
                self.floor.stats.record_cancelled();
                warn!(call_id = %call_id, "call cancelled before it was answered");
            }
            Err(e) => error!(
                call_id = %call_id,
                error = %e,
                kind = %e.kind(),
                unanswered = e.kind().is_fatal_to_call(),
                "call failed"
            ),
        }
    }

    async fn answer(&self, call_id: &str) -> Result<CallReport, DispatchError> {
        let staffing = self.floor.staffing()?;

        let (_slot, permit) = match self.admit(staffing, call_id).await {
            Ok(admitted) => admitted,
            Err(e) => {
                // The ledger only holds calls a worker may still claim.
                self.floor.queue.claim(call_id);
                return Err(e);
            }
        };
        self.floor.queue.claim(call_id);

        let claim = self.claim_staff(staffing, call_id).await?;
        let staff = StaffGuard::new(&self.floor, staffing, claim);

        let call = Call::new(call_id, &staff.claim, self.settings.durations);
        let report = call.handle(&self.cancel).await?;

        drop(staff);
        self.floor.stats.record_answered();
        drop(permit);
        Ok(report)
    }

    /// Pool slot, then admission permit.
    async fn admit(
        &self,
        staffing: &Staffing,
        call_id: &str,
    ) -> Result<(OwnedSemaphorePermit, AdmissionPermit), DispatchError> {
        let slot = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DispatchError::cancelled(call_id)),
            slot = self.pool.clone().acquire_owned() => {
                slot.map_err(|_| DispatchError::cancelled(call_id))?
            }
        };
        debug!(call_id, "worker slot acquired");

        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DispatchError::cancelled(call_id)),
            permit = staffing.limiter.acquire(call_id) => permit?,
        };
        debug!(
            call_id,
            permits_available = staffing.limiter.available(),
            "admission permit acquired"
        );
        Ok((slot, permit))
    }

    /// Retry the tiered scan until someone is free.
    ///
    /// Wakes on every staff release; the backoff sleep is the fallback when
    /// a wake-up is consumed by another worker.
    async fn claim_staff(&self, staffing: &Staffing, call_id: &str) -> Result<Claim, DispatchError> {
        let mut backoff = self.settings.staff_backoff_min;
        loop {
            let claimed = staffing.roster().find_available();
            if let Some(claim) = claimed {
                return Ok(claim);
            }
            debug!(call_id, backoff_ms = backoff.as_millis() as u64, "no staff free, waiting");

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(DispatchError::cancelled(call_id)),
                _ = staffing.freed.notified() => {}
                _ = tokio::time::sleep(backoff) => {
                    backoff = (backoff * 2).min(self.settings.staff_backoff_max);
                }
            }
        }
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────────────

/// Call-center dispatcher.
///
/// Lifecycle: [`new`](Self::new) → [`configure`](Self::configure) → many
/// [`dispatch`](Self::dispatch) → [`stop_and_drain`](Self::stop_and_drain).
pub struct Dispatcher {
    settings: DispatchSettings,
    floor: Arc<Floor>,
    pool: Arc<Semaphore>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    /// `false` once shutdown began. Held for reading across the
    /// check-and-spawn in `dispatch` so no task slips past a drain.
    accepting: RwLock<bool>,
}

impl Dispatcher {
    pub fn new(settings: DispatchSettings) -> Result<Self, DispatchError> {
        if settings.max_concurrent_calls == 0 {
            return Err(DispatchError::config("max_concurrent_calls must be positive"));
        }
        if settings.staff_backoff_min.is_zero()
            || settings.staff_backoff_max < settings.staff_backoff_min
        {
            return Err(DispatchError::config("invalid staff backoff bounds"));
        }
        Ok(Self {
            settings,
            floor: Arc::new(Floor::default()),
            pool: Arc::new(Semaphore::new(settings.max_concurrent_calls)),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            accepting: RwLock::new(true),
        })
    }

    /// Build and configure a dispatcher from [`CallCenterConfig`], with the
    /// roster generated from the per-tier counts.
    pub fn from_config(config: &CallCenterConfig) -> Result<Self, DispatchError> {
        let dispatcher = Self::new(config.dispatch_settings()?)?;
        dispatcher.configure(
            Roster::from_counts(config.staff_counts()),
            config.admission_permits,
        )?;
        Ok(dispatcher)
    }

    /// Install the roster and the admission limit (`None` = roster size).
    /// May be called once, before the first dispatch.
    pub fn configure(
        &self,
        roster: Roster,
        admission_permits: Option<usize>,
    ) -> Result<(), DispatchError> {
        if roster.is_empty() {
            return Err(DispatchError::config("roster needs at least one staff member"));
        }
        let staff = roster.len();
        let limiter = AdmissionLimiter::new(admission_permits.unwrap_or(staff))?;
        let permits = limiter.capacity();

        self.floor
            .staffing
            .set(Staffing {
                roster: Mutex::new(roster),
                freed: Notify::new(),
                limiter,
            })
            .map_err(|_| DispatchError::config("dispatcher is already configured"))?;

        info!(
            staff,
            admission_permits = permits,
            max_concurrent_calls = self.settings.max_concurrent_calls,
            "dispatcher configured"
        );
        Ok(())
    }

    /// Queue a call and schedule its handling. Returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, call_id: impl Into<String>) -> Result<(), DispatchError> {
        let call_id = call_id.into();
        let accepting = self.accepting.read().unwrap_or_else(|e| e.into_inner());
        if !*accepting {
            return Err(DispatchError::RejectedAfterShutdown { call_id });
        }
        self.floor.staffing()?;
        let runtime = Handle::try_current()
            .map_err(|_| DispatchError::config("dispatch requires a running tokio runtime"))?;

        info!(call_id = %call_id, "new call");
        self.floor.queue.push(call_id.clone());
        self.floor.stats.record_submitted();

        let worker = Worker {
            floor: self.floor.clone(),
            pool: self.pool.clone(),
            settings: self.settings,
            cancel: self.cancel.clone(),
        };
        self.tracker.spawn_on(worker.run(call_id), &runtime);
        Ok(())
    }

    /// Refuse new calls, then wait for every accepted call to finish.
    pub async fn stop_and_drain(&self) {
        self.close_intake();
        info!(in_progress = self.tracker.len(), "draining dispatcher");
        self.tracker.wait().await;
        info!(answered = self.calls_answered(), "dispatcher drained");
    }

    /// Refuse new calls and interrupt every worker, then wait for them to
    /// unwind. Interrupted calls are counted as cancelled.
    pub async fn cancel_now(&self) {
        self.close_intake();
        warn!(in_progress = self.tracker.len(), "cancelling in-progress calls");
        self.cancel.cancel();
        if let Ok(staffing) = self.floor.staffing() {
            staffing.limiter.close();
        }
        self.tracker.wait().await;
        info!(
            answered = self.calls_answered(),
            cancelled = self.floor.stats.cancelled(),
            "dispatcher cancelled"
        );
    }

    fn close_intake(&self) {
        *self.accepting.write().unwrap_or_else(|e| e.into_inner()) = false;
        self.tracker.close();
    }

    pub fn is_accepting(&self) -> bool {
        *self.accepting.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Calls handled end to end.
    pub fn calls_answered(&self) -> u64 {
        self.floor.stats.answered()
    }

    /// Ids submitted but not yet claimed by a worker, in submission order.
    pub fn pending_queue_snapshot(&self) -> Vec<String> {
        self.floor.queue.snapshot()
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.floor.stats
    }

    /// Copy of the staff records (empty before `configure`).
    pub fn staff(&self) -> Vec<StaffMember> {
        self.floor
            .staffing()
            .map(|s| s.roster().members().to_vec())
            .unwrap_or_default()
    }

    pub fn roster_busy_count(&self) -> usize {
        self.floor
            .staffing()
            .map(|s| s.roster().busy_count())
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> DispatchSnapshot {
        let stats = &self.floor.stats;
        let (staff_busy, staff_available, admission_permits_available) =
            match self.floor.staffing() {
                Ok(s) => {
                    let roster = s.roster();
                    (
                        roster.busy_count(),
                        roster.available_count(),
                        s.limiter.available(),
                    )
                }
                Err(_) => (0, 0, 0),
            };
        DispatchSnapshot {
            submitted: stats.submitted(),
            answered: stats.answered(),
            cancelled: stats.cancelled(),
            in_flight: stats.in_flight(),
            peak_in_flight: stats.peak_in_flight(),
            pending: self.floor.queue.len(),
            staff_busy,
            staff_available,
            admission_permits_available,
        }
    }
}
