//! Dispatch error taxonomy.
//!
//! | Kind          | Fatal to call | Recovered locally |
//! |---------------|---------------|-------------------|
//! | Configuration | yes           | no                |
//! | Rejected      | yes           | no                |
//! | Cancelled     | yes           | yes               |
//! | Roster        | no            | no                |
//!
//! Transient staff unavailability is not an error; workers wait it out.

use std::fmt;

use staffing::RosterError;
use thiserror::Error;

/// Coarse classification of a [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Dispatcher used before `configure`, or with invalid limits.
    Configuration,
    /// `dispatch` after shutdown began.
    Rejected,
    /// A worker was interrupted while waiting or handling.
    Cancelled,
    /// Roster bookkeeping was violated (double release, foreign claim).
    Roster,
}

impl ErrorKind {
    /// The call this error belongs to will never be answered.
    pub fn is_fatal_to_call(self) -> bool {
        matches!(self, Self::Configuration | Self::Rejected | Self::Cancelled)
    }

    /// Handled inside the worker: claims released, counter untouched.
    pub fn is_recovered_locally(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Rejected => write!(f, "rejected"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Roster => write!(f, "roster"),
        }
    }
}

/// Errors surfaced by the dispatcher and its components.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Call {call_id} rejected: dispatcher is shutting down")]
    RejectedAfterShutdown { call_id: String },

    #[error("Call {call_id} cancelled before it was answered")]
    Cancelled { call_id: String },

    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::RejectedAfterShutdown { .. } => ErrorKind::Rejected,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Roster(_) => ErrorKind::Roster,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn cancelled(call_id: impl Into<String>) -> Self {
        Self::Cancelled {
            call_id: call_id.into(),
        }
    }
}
