//! Persistent store boundary
//!
//! The engine never reads a value, changes it in memory and writes it back.
//! Every write it needs is one of the atomic primitives below, and the store
//! is responsible for serialising concurrent calls on the same key.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;

use super::error::StoreResult;
use super::models::{
    Achievement, CompletionOutcome, CompletionRecord, PendingCredit, Track, UserId,
    UserProgressRecord, XpCredit,
};
use super::streaks::StreakChange;

/// Result of applying an XP credit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditOutcome {
    /// The ledger entry was new; balance and streak were updated with it
    Applied {
        record: UserProgressRecord,
        streak: StreakChange,
    },
    /// The source was credited before; nothing changed
    Duplicate { record: UserProgressRecord },
}

impl CreditOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Storage primitives the progress engine relies on
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Insert a completion keyed by (user, item) in one conditional write.
    ///
    /// Returns [`CompletionOutcome::AlreadyCompleted`] without side effects
    /// when the key exists.
    async fn insert_completion(&self, record: &CompletionRecord) -> StoreResult<CompletionOutcome>;

    /// Atomically record the credit in the ledger and, if it is new,
    /// increment-or-create the (user, track) record and advance its streak.
    async fn apply_credit(&self, credit: &XpCredit) -> StoreResult<CreditOutcome>;

    /// Load one progress record
    async fn progress(&self, user: &UserId, track: Track) -> StoreResult<Option<UserProgressRecord>>;

    /// Load every progress record of a user
    async fn progress_for_user(&self, user: &UserId) -> StoreResult<Vec<UserProgressRecord>>;

    /// Append an achievement; the share token must be unique
    async fn append_achievement(&self, achievement: &Achievement) -> StoreResult<()>;

    /// A user's achievements, most recent first
    async fn list_achievements(&self, user: &UserId) -> StoreResult<Vec<Achievement>>;

    /// Completions that have no ledger entry for their credit source, oldest first
    async fn pending_credits(&self, limit: usize) -> StoreResult<Vec<PendingCredit>>;
}
