//! Errors surfaced by [`Scheduler::simulate`](crate::Scheduler::simulate)
//! and [`Simulation::restore`](crate::Simulation::restore).

use std::error::Error;
use std::fmt;

use tessera_core::StepId;
use tessera_space::SpaceError;
use tessera_store::StoreError;

/// Errors from running or restoring a simulation.
///
/// Per-agent behavior failures are not errors at this level: they are
/// logged, counted in [`StepMetrics`](crate::StepMetrics), and the agent
/// is skipped for the step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// Store and index bookkeeping disagree. Fatal.
    InvariantViolation {
        /// Description of the broken invariant.
        reason: String,
    },
    /// A previous step was interrupted (a behavior panicked) and the
    /// scheduler's state can no longer be trusted. Fatal.
    Poisoned {
        /// The step that was interrupted.
        step: StepId,
    },
    /// An agent store operation failed.
    Store(StoreError),
    /// The spatial index could not be rebuilt.
    Space(SpaceError),
}

impl StepError {
    /// Whether the run must be aborted.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvariantViolation { .. } | Self::Poisoned { .. } => true,
            Self::Store(e) => e.is_fatal(),
            Self::Space(_) => false,
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvariantViolation { reason } => write!(f, "invariant violated: {reason}"),
            Self::Poisoned { step } => {
                write!(f, "scheduler poisoned: step {step} was interrupted")
            }
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Space(e) => write!(f, "spatial index: {e}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Space(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for StepError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<SpaceError> for StepError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}
