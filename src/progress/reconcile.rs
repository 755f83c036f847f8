//! Repair of recorded-but-uncredited completions
//!
//! A request can stop after its completion row is written but before the
//! credit lands (timeout, store outage, crash). Such a completion has no
//! ledger entry for its credit source, which is how it is found here. The
//! credit is replayed through the ledger, keyed by the same source, so a
//! repair racing a live retry still credits once. A repaired credit earns the
//! same streak achievements it would have earned on time.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::achievements::AchievementIssuer;
use super::error::ProgressResult;
use super::ledger::XpLedger;
use super::models::{PendingCredit, XpCredit};
use super::store::ProgressStore;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub scanned: usize,
    pub repaired: usize,
    /// Credited by someone else between scan and repair
    pub already_credited: usize,
    pub failed: usize,
}

/// Finds and repairs pending credits
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn ProgressStore>,
    ledger: XpLedger,
    issuer: AchievementIssuer,
    streak_milestones: Vec<u32>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        ledger: XpLedger,
        issuer: AchievementIssuer,
        streak_milestones: Vec<u32>,
    ) -> Self {
        Self {
            store,
            ledger,
            issuer,
            streak_milestones,
        }
    }

    /// Completions still waiting for their credit, oldest first
    pub async fn pending(&self, limit: usize) -> ProgressResult<Vec<PendingCredit>> {
        Ok(self.store.pending_credits(limit).await?)
    }

    /// Replay up to `limit` pending credits.
    ///
    /// The scan itself failing is an error; individual repairs that fail
    /// are counted and left pending for the next pass.
    pub async fn reconcile(&self, limit: usize) -> ProgressResult<ReconcileReport> {
        let pending = self.pending(limit).await?;
        let mut report = ReconcileReport {
            scanned: pending.len(),
            ..Default::default()
        };

        for item in pending {
            // Credit on the completion's own day so the streak reflects when the work happened
            let credit = XpCredit {
                user_id: item.user_id.clone(),
                track: item.track,
                source: item.source.clone(),
                delta: item.xp,
                at: item.completed_at,
            };

            match self.ledger.apply(&credit).await {
                Ok(outcome) if outcome.applied() => {
                    report.repaired += 1;
                    self.issuer
                        .issue_for_credit(&outcome, &self.streak_milestones, item.completed_at)
                        .await;
                }
                Ok(_) => report.already_credited += 1,
                Err(e) => {
                    warn!(
                        user = %item.user_id,
                        source = %item.source.key(),
                        error = %e,
                        "pending credit repair failed"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.scanned > 0 {
            info!(
                scanned = report.scanned,
                repaired = report.repaired,
                already_credited = report.already_credited,
                failed = report.failed,
                "reconciliation pass finished"
            );
        }
        Ok(report)
    }
}
