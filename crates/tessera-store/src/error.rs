//! Store-specific error types.

use std::error::Error;
use std::fmt;

use tessera_core::{AgentId, BehaviorError, PartitionId};

/// Errors from [`AgentStore`](crate::AgentStore) operations.
///
/// [`NotFound`](Self::NotFound) and
/// [`PartitionOutOfRange`](Self::PartitionOutOfRange) are recoverable at
/// the call site. [`InvariantViolation`](Self::InvariantViolation) means
/// the store's bookkeeping can no longer be trusted and callers must treat
/// it as fatal; see [`is_fatal`](Self::is_fatal).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// No live agent carries this id.
    NotFound {
        /// The unknown id.
        id: AgentId,
    },
    /// The requested partition does not exist.
    PartitionOutOfRange {
        /// The requested partition.
        partition: PartitionId,
        /// Number of partitions in the store.
        partition_count: usize,
    },
    /// Structural misuse or inconsistent bookkeeping, e.g. a duplicate id
    /// on insertion or a checkpoint whose identity map does not cover its
    /// slots exactly once.
    InvariantViolation {
        /// Description of the broken invariant.
        reason: String,
    },
}

impl StoreError {
    /// Whether continuing after this error risks silent corruption.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }

    pub(crate) fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "agent {id} not found"),
            Self::PartitionOutOfRange {
                partition,
                partition_count,
            } => write!(
                f,
                "partition {partition} out of range (store has {partition_count})"
            ),
            Self::InvariantViolation { reason } => {
                write!(f, "store invariant violated: {reason}")
            }
        }
    }
}

impl Error for StoreError {}

impl From<StoreError> for BehaviorError {
    fn from(e: StoreError) -> Self {
        BehaviorError::ExecutionFailed {
            reason: e.to_string(),
        }
    }
}
