//! Error taxonomy for mood configuration and runtime lookups.

use std::fmt;
use thiserror::Error;

/// What kind of entity a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    State,
    Stimulus,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::State => write!(f, "state"),
            EntityKind::Stimulus => write!(f, "stimulus"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoodError {
    /// Malformed or incomplete state/stimulus configuration. Raised once at load;
    /// construction aborts and nothing is partially loaded.
    #[error("invalid mood configuration: {0}")]
    Config(String),

    /// Unknown stimulus id or unresolved state reference at call time.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// Internal state no longer resolves (e.g. the current-state pointer).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl MoodError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        MoodError::Config(msg.into())
    }

    pub fn state_not_found(id: impl Into<String>) -> Self {
        MoodError::NotFound {
            kind: EntityKind::State,
            id: id.into(),
        }
    }

    pub fn stimulus_not_found(id: impl Into<String>) -> Self {
        MoodError::NotFound {
            kind: EntityKind::Stimulus,
            id: id.into(),
        }
    }

    /// Only lookup failures are worth retrying with a different id.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MoodError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, MoodError>;
