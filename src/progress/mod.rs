//! Progress & gamification engine
//!
//! Tracks XP per (user, track), daily activity streaks, one-time lesson and
//! daily-challenge completions, and achievement issuance.
//!
//! # Architecture
//!
//! ```text
//!   complete_lesson / complete_daily_challenge      award_xp
//!                 │                                    │
//!                 ▼                                    │
//!          CompletionGuard ── AlreadyCompleted ─▶ false │
//!                 │ Created                            │
//!                 ▼                                    ▼
//!              XpLedger (ledger entry + XP + streak, one transaction)
//!                 │
//!                 ▼
//!        milestone check ─▶ AchievementIssuer (best effort)
//! ```
//!
//! The engine is stateless between calls and holds no locks. All atomicity
//! comes from the [`ProgressStore`] primitives.
//!
//! # Usage
//!
//! ```ignore
//! let store = Arc::new(SqliteStore::open(&path)?);
//! let engine = ProgressEngine::new(store);
//!
//! let user = UserId::new("u-42")?;
//! let credited = engine.complete_lesson(&user, "net-101", 25, Track::Learning).await?;
//! ```

mod clock;
mod error;
mod guard;
mod ledger;
mod levels;
mod models;
mod reconcile;
mod streaks;

pub mod achievements;
pub mod store;

pub use achievements::{AchievementIssuer, AchievementRequest, Badge};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ProgressError, ProgressResult, StoreError, StoreResult};
pub use guard::CompletionGuard;
pub use ledger::XpLedger;
pub use levels::{Level, LevelStanding, LEVELS};
pub use models::{
    Achievement, AchievementType, CompletionOutcome, CompletionRecord, CreditSource,
    DailyChallengeCompletion, LessonCompletion, PendingCredit, Track, UserId, UserProgressRecord,
    XpCredit,
};
pub use reconcile::{ReconcileReport, Reconciler};
pub use store::{CreditOutcome, ProgressStore, SqliteStore};
pub use streaks::{StreakChange, StreakEngine, StreakState};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use achievements::DEFAULT_STREAK_MILESTONES;

/// Wrong answers earn this fraction of the reward (rounded down)
pub const PARTIAL_CREDIT_DIVISOR: u64 = 3;

/// XP for a daily challenge answer
pub fn daily_challenge_xp(xp_reward: u64, was_correct: bool) -> u64 {
    if was_correct {
        xp_reward
    } else {
        xp_reward / PARTIAL_CREDIT_DIVISOR
    }
}

/// Tunables for the engine
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Streak lengths that issue a streak achievement, lowest tier first
    pub streak_milestones: Vec<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            streak_milestones: DEFAULT_STREAK_MILESTONES.to_vec(),
        }
    }
}

/// All progress of one user, for dashboards
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub user_id: UserId,
    pub tracks: Vec<UserProgressRecord>,
    pub total_xp: u64,
    pub best_streak: u32,
    /// Longest streak that activity today can still extend
    pub live_streak: u32,
    pub level: LevelStanding,
}

/// Operation surface of the progress subsystem
#[derive(Clone)]
pub struct ProgressEngine {
    store: Arc<dyn ProgressStore>,
    guard: CompletionGuard,
    ledger: XpLedger,
    issuer: AchievementIssuer,
    reconciler: Reconciler,
    clock: Arc<dyn Clock>,
    options: EngineOptions,
}

impl ProgressEngine {
    /// Create an engine on `store` with the wall clock and default options
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self::with_options(store, Arc::new(SystemClock), EngineOptions::default())
    }

    pub fn with_options(store: Arc<dyn ProgressStore>, clock: Arc<dyn Clock>, options: EngineOptions) -> Self {
        let ledger = XpLedger::new(Arc::clone(&store));
        let issuer = AchievementIssuer::new(Arc::clone(&store));
        Self {
            guard: CompletionGuard::new(Arc::clone(&store)),
            reconciler: Reconciler::new(
                Arc::clone(&store),
                ledger.clone(),
                issuer.clone(),
                options.streak_milestones.clone(),
            ),
            issuer,
            ledger,
            store,
            clock,
            options,
        }
    }

    /// Credit `amount` XP outside any lesson or challenge
    pub async fn award_xp(&self, user: &UserId, track: Track, amount: i64) -> ProgressResult<bool> {
        let now = self.clock.now();
        let source = CreditSource::Manual(Uuid::new_v4().to_string());
        let outcome = self.ledger.award(user, track, amount, source, now).await?;
        self.after_credit(&outcome, now).await;
        Ok(outcome.applied())
    }

    /// Complete a lesson once; `false` if it was already completed
    pub async fn complete_lesson(
        &self,
        user: &UserId,
        lesson_id: &str,
        xp_reward: i64,
        track: Track,
    ) -> ProgressResult<bool> {
        let lesson_id = validate_item_id("lesson", lesson_id)?;
        let xp = XpLedger::validate_delta(xp_reward)?;
        let now = self.clock.now();

        let record = CompletionRecord::Lesson(LessonCompletion {
            user_id: user.clone(),
            lesson_id,
            track,
            xp_earned: xp,
            created_at: now,
        });
        self.complete(record, now).await
    }

    /// Answer a daily challenge once.
    ///
    /// A correct answer earns `xp_reward`; a wrong one a third of it, rounded down.
    pub async fn complete_daily_challenge(
        &self,
        user: &UserId,
        challenge_id: &str,
        was_correct: bool,
        xp_reward: i64,
        track: Track,
    ) -> ProgressResult<bool> {
        let challenge_id = validate_item_id("challenge", challenge_id)?;
        let reward = XpLedger::validate_delta(xp_reward)?;
        let now = self.clock.now();

        let record = CompletionRecord::DailyChallenge(DailyChallengeCompletion {
            user_id: user.clone(),
            challenge_id,
            track,
            was_correct,
            xp_earned: daily_challenge_xp(reward, was_correct),
            created_at: now,
        });
        self.complete(record, now).await
    }

    async fn complete(&self, record: CompletionRecord, now: DateTime<Utc>) -> ProgressResult<bool> {
        if !self.guard.try_complete(&record).await?.created() {
            return Ok(false);
        }

        let credit = XpCredit {
            user_id: record.user_id().clone(),
            track: record.track(),
            source: record.credit_source(),
            delta: record.xp_earned(),
            at: now,
        };

        let outcome = match self.ledger.apply(&credit).await {
            Ok(outcome) => outcome,
            Err(ProgressError::StoreUnavailable(source)) => {
                error!(
                    user = %credit.user_id,
                    source = %credit.source.key(),
                    xp = credit.delta,
                    error = %source,
                    "completion recorded but credit failed; left for reconciliation"
                );
                return Err(ProgressError::PartialFailure {
                    user: credit.user_id,
                    source_key: credit.source,
                    xp: credit.delta,
                    source,
                });
            }
            Err(e) => return Err(e),
        };

        self.after_credit(&outcome, now).await;
        Ok(true)
    }

    /// Opportunistic milestone issuance; never fails the credit
    async fn after_credit(&self, outcome: &CreditOutcome, now: DateTime<Utc>) {
        self.issuer
            .issue_for_credit(outcome, &self.options.streak_milestones, now)
            .await;
    }

    /// Issue an achievement on request
    pub async fn issue_achievement(
        &self,
        user: &UserId,
        achievement_type: AchievementType,
        title: &str,
        description: &str,
        xp_earned: i64,
        badge_index: usize,
    ) -> ProgressResult<Achievement> {
        let request = AchievementRequest {
            achievement_type,
            title: title.to_string(),
            description: description.to_string(),
            xp_earned,
            badge_index,
        };
        self.issuer.issue(user, &request, self.clock.now()).await
    }

    /// A user's achievements, most recent first
    pub async fn list_achievements(&self, user: &UserId) -> ProgressResult<Vec<Achievement>> {
        Ok(self.store.list_achievements(user).await?)
    }

    /// Current record for (user, track), if any activity exists
    pub async fn progress(&self, user: &UserId, track: Track) -> ProgressResult<Option<UserProgressRecord>> {
        Ok(self.store.progress(user, track).await?)
    }

    /// Totals across every track of a user
    pub async fn summary(&self, user: &UserId) -> ProgressResult<ProgressSummary> {
        let tracks = self.store.progress_for_user(user).await?;
        let now = self.clock.now();
        let total_xp = tracks.iter().map(|r| r.xp_points).fold(0u64, u64::saturating_add);
        let best_streak = tracks.iter().map(|r| r.longest_streak).max().unwrap_or(0);
        let live_streak = tracks
            .iter()
            .filter(|r| StreakEngine::is_active(&StreakState::from(*r), now))
            .map(|r| r.streak_days)
            .max()
            .unwrap_or(0);
        Ok(ProgressSummary {
            user_id: user.clone(),
            tracks,
            total_xp,
            best_streak,
            live_streak,
            level: LevelStanding::new(total_xp),
        })
    }

    /// Completions whose credit has not landed yet
    pub async fn pending_credits(&self, limit: usize) -> ProgressResult<Vec<PendingCredit>> {
        self.reconciler.pending(limit).await
    }

    /// Replay up to `limit` pending credits
    pub async fn reconcile(&self, limit: usize) -> ProgressResult<ReconcileReport> {
        self.reconciler.reconcile(limit).await
    }
}

fn validate_item_id(kind: &str, id: &str) -> ProgressResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ProgressError::Validation(format!("{kind} id is missing")));
    }
    Ok(id.to_string())
}
