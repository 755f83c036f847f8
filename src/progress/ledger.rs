//! XP ledger
//!
//! Credits are validated here and applied by the store as one atomic step:
//! the ledger entry for the credit source, the XP increment and the streak
//! update commit together or not at all.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::error::{ProgressError, ProgressResult};
use super::models::{CreditSource, Track, UserId, XpCredit};
use super::store::{CreditOutcome, ProgressStore};
use super::streaks::StreakChange;

/// Applies XP deltas to per-user, per-track balances
#[derive(Clone)]
pub struct XpLedger {
    store: Arc<dyn ProgressStore>,
}

impl XpLedger {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Check a raw delta before anything reaches the store
    pub fn validate_delta(delta: i64) -> ProgressResult<u64> {
        u64::try_from(delta)
            .map_err(|_| ProgressError::Validation(format!("XP delta must be non-negative, got {delta}")))
    }

    /// Credit `delta` XP to (user, track) for `source`, at most once per source
    pub async fn award(
        &self,
        user: &UserId,
        track: Track,
        delta: i64,
        source: CreditSource,
        at: DateTime<Utc>,
    ) -> ProgressResult<CreditOutcome> {
        let delta = Self::validate_delta(delta)?;
        let credit = XpCredit {
            user_id: user.clone(),
            track,
            source,
            delta,
            at,
        };
        self.apply(&credit).await
    }

    /// Apply an already-validated credit
    pub async fn apply(&self, credit: &XpCredit) -> ProgressResult<CreditOutcome> {
        let outcome = self.store.apply_credit(credit).await?;

        match &outcome {
            CreditOutcome::Applied { record, streak } => {
                info!(
                    user = %credit.user_id,
                    track = %credit.track,
                    source = %credit.source.key(),
                    delta = credit.delta,
                    total = record.xp_points,
                    streak_days = record.streak_days,
                    streak = streak.as_str(),
                    "XP credited"
                );
                if *streak == StreakChange::ClockSkew {
                    warn!(
                        user = %credit.user_id,
                        track = %credit.track,
                        at = %credit.at,
                        last_activity_at = %record.last_activity_at,
                        "activity dated before last activity; streak left unchanged"
                    );
                }
            }
            CreditOutcome::Duplicate { record } => {
                debug!(
                    user = %credit.user_id,
                    source = %credit.source.key(),
                    total = record.xp_points,
                    "credit source already applied"
                );
            }
        }

        Ok(outcome)
    }
}
