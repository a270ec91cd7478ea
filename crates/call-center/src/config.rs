//! Runtime configuration for the dispatcher.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (applied by the binary)
//! 2. Environment variables (`CALL_CENTER_*`)
//! 3. Built-in defaults below
//!
//! No configuration file is read.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use staffing::StaffCounts;
use tracing::warn;

use crate::call::DurationRange;
use crate::errors::DispatchError;

/// Shortest simulated call, in seconds.
pub const DEFAULT_MIN_CALL_DURATION_SECS: u64 = 5;
/// Longest simulated call, in seconds.
pub const DEFAULT_MAX_CALL_DURATION_SECS: u64 = 10;
/// Worker pool size.
pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 10;
pub const DEFAULT_OPERATOR_COUNT: usize = 3;
pub const DEFAULT_SUPERVISOR_COUNT: usize = 2;
pub const DEFAULT_DIRECTOR_COUNT: usize = 1;
/// First wait when an admitted worker finds no free staff.
pub const DEFAULT_STAFF_BACKOFF_MIN: Duration = Duration::from_millis(10);
/// Backoff ceiling for the staff wait.
pub const DEFAULT_STAFF_BACKOFF_MAX: Duration = Duration::from_millis(250);

const ENV_MIN_DURATION: &str = "CALL_CENTER_MIN_CALL_DURATION_SECONDS";
const ENV_MAX_DURATION: &str = "CALL_CENTER_MAX_CALL_DURATION_SECONDS";
const ENV_MAX_CONCURRENT: &str = "CALL_CENTER_MAX_CONCURRENT_CALLS";
const ENV_OPERATORS: &str = "CALL_CENTER_OPERATOR_COUNT";
const ENV_SUPERVISORS: &str = "CALL_CENTER_SUPERVISOR_COUNT";
const ENV_DIRECTORS: &str = "CALL_CENTER_DIRECTOR_COUNT";
const ENV_PERMITS: &str = "CALL_CENTER_ADMISSION_PERMITS";

/// Every tunable the core consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCenterConfig {
    pub min_call_duration_seconds: u64,
    pub max_call_duration_seconds: u64,
    /// Size of the worker pool.
    pub max_concurrent_calls: usize,
    pub operator_count: usize,
    pub supervisor_count: usize,
    pub director_count: usize,
    /// Admission limit; `None` means one permit per staff member.
    pub admission_permits: Option<usize>,
}

impl Default for CallCenterConfig {
    fn default() -> Self {
        Self {
            min_call_duration_seconds: DEFAULT_MIN_CALL_DURATION_SECS,
            max_call_duration_seconds: DEFAULT_MAX_CALL_DURATION_SECS,
            max_concurrent_calls: DEFAULT_MAX_CONCURRENT_CALLS,
            operator_count: DEFAULT_OPERATOR_COUNT,
            supervisor_count: DEFAULT_SUPERVISOR_COUNT,
            director_count: DEFAULT_DIRECTOR_COUNT,
            admission_permits: None,
        }
    }
}

impl CallCenterConfig {
    /// Defaults with `CALL_CENTER_*` environment overrides applied.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_call_duration_seconds: env_or(ENV_MIN_DURATION, defaults.min_call_duration_seconds),
            max_call_duration_seconds: env_or(ENV_MAX_DURATION, defaults.max_call_duration_seconds),
            max_concurrent_calls: env_or(ENV_MAX_CONCURRENT, defaults.max_concurrent_calls),
            operator_count: env_or(ENV_OPERATORS, defaults.operator_count),
            supervisor_count: env_or(ENV_SUPERVISORS, defaults.supervisor_count),
            director_count: env_or(ENV_DIRECTORS, defaults.director_count),
            admission_permits: env::var(ENV_PERMITS)
                .ok()
                .and_then(|raw| parse_or_warn(ENV_PERMITS, &raw)),
        }
    }

    /// Check every constraint, returning the first one violated.
    pub fn validate(&self) -> Result<(), DispatchError> {
        DurationRange::new(self.min_call_duration_seconds, self.max_call_duration_seconds)?;
        if self.max_concurrent_calls == 0 {
            return Err(DispatchError::config("max_concurrent_calls must be positive"));
        }
        if self.admission_permits == Some(0) {
            return Err(DispatchError::config("admission_permits must be positive"));
        }
        if self.staff_counts().total() == 0 {
            return Err(DispatchError::config("roster needs at least one staff member"));
        }
        Ok(())
    }

    pub fn staff_counts(&self) -> StaffCounts {
        StaffCounts::new(self.operator_count, self.supervisor_count, self.director_count)
    }

    /// Validated settings for [`crate::Dispatcher::new`].
    pub fn dispatch_settings(&self) -> Result<DispatchSettings, DispatchError> {
        self.validate()?;
        Ok(DispatchSettings {
            durations: DurationRange::new(
                self.min_call_duration_seconds,
                self.max_call_duration_seconds,
            )?,
            max_concurrent_calls: self.max_concurrent_calls,
            ..DispatchSettings::default()
        })
    }
}

/// Settings fixed for the lifetime of a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub durations: DurationRange,
    pub max_concurrent_calls: usize,
    pub staff_backoff_min: Duration,
    pub staff_backoff_max: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            durations: DurationRange {
                min_secs: DEFAULT_MIN_CALL_DURATION_SECS,
                max_secs: DEFAULT_MAX_CALL_DURATION_SECS,
            },
            max_concurrent_calls: DEFAULT_MAX_CONCURRENT_CALLS,
            staff_backoff_min: DEFAULT_STAFF_BACKOFF_MIN,
            staff_backoff_max: DEFAULT_STAFF_BACKOFF_MAX,
        }
    }
}

impl DispatchSettings {
    pub fn with_durations(mut self, durations: DurationRange) -> Self {
        self.durations = durations;
        self
    }

    pub fn with_max_concurrent_calls(mut self, n: usize) -> Self {
        self.max_concurrent_calls = n;
        self
    }
}

fn env_or<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|raw| parse_or_warn(name, &raw))
        .unwrap_or(default)
}

fn parse_or_warn<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = raw, "ignoring unparseable environment override");
            None
        }
    }
}
