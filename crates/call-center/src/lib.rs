//! Call-center dispatch engine.
//!
//! Incoming calls are queued and handed to the least-senior free staff
//! member, with two independent bounds on concurrency: the worker pool
//! (`max_concurrent_calls`) and the admission limiter (`admission_permits`).
//!
//! ## Modules
//!
//! | Module       | Purpose                                              |
//! |--------------|------------------------------------------------------|
//! | `call`       | Call unit: random duration, cancellable handling     |
//! | `config`     | Tunables with env overrides and validation           |
//! | `dispatcher` | Orchestrator: admission, staff selection, drain      |
//! | `errors`     | Error taxonomy                                       |
//! | `limiter`    | Counting-permit admission limiter                    |
//! | `queue`      | FIFO ledger of submitted, unclaimed calls            |
//! | `stats`      | Answered/cancelled/in-flight counters                |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use call_center::{CallCenterConfig, Dispatcher};
//!
//! # async fn run() -> Result<(), call_center::DispatchError> {
//! let dispatcher = Dispatcher::from_config(&CallCenterConfig::default())?;
//! for id in ["a1", "b2", "c3"] {
//!     dispatcher.dispatch(id)?;
//! }
//! dispatcher.stop_and_drain().await;
//! assert_eq!(dispatcher.calls_answered(), 3);
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod limiter;
pub mod queue;
pub mod stats;

pub use call::{Call, CallReport, DurationRange};
pub use config::{CallCenterConfig, DispatchSettings};
pub use dispatcher::Dispatcher;
pub use errors::{DispatchError, ErrorKind};
pub use limiter::{AdmissionLimiter, AdmissionPermit};
pub use queue::PendingQueue;
pub use stats::{DispatchSnapshot, DispatchStats};

pub use staffing::{Claim, Roster, RosterError, StaffCounts, StaffMember, StaffTier};
