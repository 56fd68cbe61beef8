//! Error types shared across the Tessera workspace.
//!
//! Subsystem-specific errors live beside their subsystem (`StoreError`
//! in `tessera-store`, `SpaceError` in `tessera-space`, `StepError` in
//! `tessera-engine`). The types here are used by more than one crate.

use std::error::Error;
use std::fmt;

/// Errors returned by a behavior while processing a single agent.
///
/// The scheduler treats these as recoverable: the failing agent's staged
/// mutations are rolled back, its state reverts to the tick-start value,
/// and the step continues with the remaining agents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BehaviorError {
    /// The behavior could not complete.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The agent was in a state the behavior cannot handle
    /// (non-finite position, negative diameter, ...).
    InvalidState {
        /// Description of the offending state.
        reason: String,
    },
}

impl BehaviorError {
    /// Shorthand for [`BehaviorError::ExecutionFailed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`BehaviorError::InvalidState`].
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BehaviorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::InvalidState { reason } => write!(f, "invalid agent state: {reason}"),
        }
    }
}

impl Error for BehaviorError {}

/// Errors from keyed collaborator registries (field grids, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A collaborator is already registered under this id or name.
    DuplicateKey {
        /// The conflicting key, rendered for diagnostics.
        key: String,
    },
    /// No collaborator is registered under this id or name.
    NotFound {
        /// The missing key, rendered for diagnostics.
        key: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { key } => write!(f, "duplicate registry key '{key}'"),
            Self::NotFound { key } => write!(f, "registry key '{key}' not found"),
        }
    }
}

impl Error for RegistryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behavior_error_display() {
        let e = BehaviorError::failed("no room to divide");
        assert_eq!(e.to_string(), "execution failed: no room to divide");
        let e = BehaviorError::invalid_state("diameter is NaN");
        assert_eq!(e.to_string(), "invalid agent state: diameter is NaN");
    }

    #[test]
    fn registry_error_display() {
        let e = RegistryError::DuplicateKey {
            key: "substance 3".into(),
        };
        assert_eq!(e.to_string(), "duplicate registry key 'substance 3'");
    }
}
