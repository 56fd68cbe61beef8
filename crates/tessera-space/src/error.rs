//! Error types for spatial index construction and queries.

use std::fmt;

use tessera_core::{AgentId, BehaviorError};

/// Errors from [`UniformGrid`](crate::UniformGrid) construction or queries.
#[derive(Clone, Debug, PartialEq)]
pub enum SpaceError {
    /// The configured or derived cell size is not a positive finite number.
    InvalidCellSize {
        /// The rejected size.
        value: f64,
    },
    /// The agent was not present at the last rebuild, or the grid has
    /// never been built.
    NotIndexed {
        /// The agent that was looked up.
        id: AgentId,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { value } => {
                write!(f, "cell size must be positive and finite, got {value}")
            }
            Self::NotIndexed { id } => write!(f, "agent {id} is not in the spatial index"),
        }
    }
}

impl std::error::Error for SpaceError {}

impl From<SpaceError> for BehaviorError {
    fn from(e: SpaceError) -> Self {
        BehaviorError::ExecutionFailed {
            reason: e.to_string(),
        }
    }
}
