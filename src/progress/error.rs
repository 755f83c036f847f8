//! Error types for the progress engine

use super::models::{CreditSource, UserId};

/// Failure reported by a [`ProgressStore`](super::store::ProgressStore)
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport or storage failure; nothing is assumed committed
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(_, _, e) => Self::Corrupt(e.to_string()),
            rusqlite::Error::InvalidColumnType(idx, name, ty) => {
                Self::Corrupt(format!("column {idx} ({name}) has type {ty}"))
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Errors surfaced by [`ProgressEngine`](super::ProgressEngine) operations.
///
/// Re-completing an item is not an error; it is reported as
/// [`CompletionOutcome::AlreadyCompleted`](super::models::CompletionOutcome).
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Malformed input, rejected before any store call
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("progress store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The completion was recorded but its credit was not applied.
    /// The gap is visible to the reconciler and will be repaired there.
    #[error("completion {} for {user} recorded but {xp} XP not credited: {source}", .source_key.key())]
    PartialFailure {
        user: UserId,
        source_key: CreditSource,
        xp: u64,
        #[source]
        source: StoreError,
    },

    #[error("achievement issuance failed: {0}")]
    AchievementIssuance(#[source] StoreError),
}

impl ProgressError {
    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(StoreError::Unavailable(_))
                | Self::AchievementIssuance(StoreError::Unavailable(_))
        )
    }
}

pub type ProgressResult<T> = Result<T, ProgressError>;
pub type StoreResult<T> = Result<T, StoreError>;
