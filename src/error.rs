//! Bug reports surfaced to the search driver.

use thiserror::Error;

use crate::event::Event;
use crate::guard::Guard;

/// A user-program bug found during symbolic execution.
///
/// Carries the exact guard of the affected runs so the driver can decide
/// per-guard what to do next (report, prune, continue other branches). Runs
/// under disjoint guards are unaffected.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("state '{state}' has no handler for event '{event}'")]
    UnhandledEvent { state: String, event: Event, guard: Guard },
}

impl CheckError {
    /// Guard of the runs that hit the bug.
    pub fn guard(&self) -> &Guard {
        match self {
            CheckError::UnhandledEvent { guard, .. } => guard,
        }
    }
}

pub type CheckResult<T> = Result<T, CheckError>;
