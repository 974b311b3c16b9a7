//! Timer error types.

use thiserror::Error;

use crate::types::TimerState;

/// Errors returned by timer commands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Focus duration of zero.
    #[error("focus duration must be at least one second")]
    InvalidDuration,

    /// Round count outside 1..=10.
    #[error("rounds must be between 1 and {max}, got {0}", max = TimerState::MAX_ROUNDS)]
    InvalidRounds(u32),

    /// The command needs a running timer.
    #[error("no timer is active")]
    NotActive,
}

impl TimerError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidDuration => "Give the focus phase a duration, e.g. --focus 25",
            Self::InvalidRounds(_) => "Pick between 1 and 10 rounds",
            Self::NotActive => "Start a timer first",
        }
    }
}
