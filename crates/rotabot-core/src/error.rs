//! Error types for RotaBot.

use thiserror::Error;

/// Top-level error type shared by all RotaBot crates.
#[derive(Debug, Error)]
pub enum RotaError {
    /// Bad roster input (empty list, duplicate identifiers, unparsable token).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not enough participants: requested {requested}, only {available} active")]
    InsufficientParticipants { requested: usize, available: usize },

    #[error("Invalid count {0}: must be between 1 and {max}", max = crate::types::MAX_ASSIGNEES)]
    InvalidCount(usize),

    /// Rotation cannot proceed: empty roster or active members missing from it.
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RotaError {
    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InsufficientParticipants { .. }
                | Self::InvalidCount(_)
                | Self::InconsistentState(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RotaError>;
