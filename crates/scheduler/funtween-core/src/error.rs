//! Error types for the scheduler

use crate::ids::ManagerId;
use crate::phase::Phase;

/// Contract violations detected while advancing a single manager.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TickError {
    /// The sequence reported a negative or non-finite duration
    #[error("Invalid sequence duration: {duration}")]
    InvalidDuration { duration: f32 },

    /// Delta became non-finite after applying timescale and direction
    #[error("Invalid effective delta: {delta}")]
    InvalidDelta { delta: f32 },
}

/// Errors surfaced by [`Scheduler`](crate::Scheduler) operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SchedulerError {
    /// A manager's tick aborted; the rest of the pass was skipped
    #[error("Manager {manager:?} failed to tick: {source}")]
    Tick {
        manager: ManagerId,
        #[source]
        source: TickError,
    },

    /// Manager not found
    #[error("Manager not found: {id:?}")]
    ManagerNotFound { id: ManagerId },

    /// A listener dispatched the phase that is currently iterating
    #[error("Phase {} dispatched while already running", .phase.name())]
    NestedDispatch { phase: Phase },
}

impl SchedulerError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "contract",
            Self::ManagerNotFound { .. } => "lookup",
            Self::NestedDispatch { .. } => "reentrancy",
        }
    }

    /// The manager whose tick failed, if any.
    #[inline]
    pub fn manager(&self) -> Option<ManagerId> {
        match self {
            Self::Tick { manager, .. } => Some(*manager),
            Self::ManagerNotFound { id } => Some(*id),
            Self::NestedDispatch { .. } => None,
        }
    }
}
