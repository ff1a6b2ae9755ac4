//! Error and guard-outcome types.

use thiserror::Error;

use crate::clock::Millis;

pub type Result<T> = std::result::Result<T, ExplorerError>;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("option {index} out of range (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("clock cannot move backwards (now {now}ms, requested {requested}ms)")]
    ClockRewind { now: Millis, requested: Millis },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of a guarded UI operation.
///
/// Guard violations (double submission, triggering a busy animation) are not
/// errors: the input is dropped and the caller learns about it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    Accepted,
    Ignored,
}

impl Outcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, Outcome::Accepted)
    }
}
