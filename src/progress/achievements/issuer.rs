//! Achievement issuance
//!
//! Issuing is append-only: a new record with a fresh share token every time.
//! On the credit path it is best effort, so a failed issuance is logged and
//! never costs the user the XP that triggered it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::definitions::badge_for;
use super::milestones::check_streak_milestone;
use crate::progress::error::{ProgressError, ProgressResult};
use crate::progress::models::{Achievement, AchievementType, UserId};
use crate::progress::store::{CreditOutcome, ProgressStore};

/// Request to mint an achievement
#[derive(Debug, Clone)]
pub struct AchievementRequest {
    pub achievement_type: AchievementType,
    pub title: String,
    pub description: String,
    pub xp_earned: i64,
    pub badge_index: usize,
}

/// Mints achievement records with deterministic badges
#[derive(Clone)]
pub struct AchievementIssuer {
    store: Arc<dyn ProgressStore>,
}

impl AchievementIssuer {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Build the record for `request` without storing it
    pub fn mint(user: &UserId, request: &AchievementRequest, at: DateTime<Utc>) -> ProgressResult<Achievement> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ProgressError::Validation("achievement title is empty".to_string()));
        }
        let xp_earned = u64::try_from(request.xp_earned).map_err(|_| {
            ProgressError::Validation(format!(
                "achievement XP must be non-negative, got {}",
                request.xp_earned
            ))
        })?;

        let badge = badge_for(request.achievement_type, request.badge_index);
        Ok(Achievement {
            id: Uuid::new_v4().to_string(),
            user_id: user.clone(),
            achievement_type: request.achievement_type,
            title: title.to_string(),
            description: request.description.trim().to_string(),
            badge_name: badge.name.to_string(),
            badge_icon: badge.icon.to_string(),
            xp_earned,
            share_token: Uuid::new_v4().simple().to_string(),
            created_at: at,
        })
    }

    /// Mint and append an achievement
    pub async fn issue(
        &self,
        user: &UserId,
        request: &AchievementRequest,
        at: DateTime<Utc>,
    ) -> ProgressResult<Achievement> {
        let achievement = Self::mint(user, request, at)?;
        self.store
            .append_achievement(&achievement)
            .await
            .map_err(ProgressError::AchievementIssuance)?;

        info!(
            user = %user,
            kind = %achievement.achievement_type,
            badge = %achievement.badge_name,
            "achievement issued"
        );
        Ok(achievement)
    }

    /// Issue without failing the caller; errors are logged and dropped
    pub async fn issue_best_effort(
        &self,
        user: &UserId,
        request: &AchievementRequest,
        at: DateTime<Utc>,
    ) -> Option<Achievement> {
        match self.issue(user, request, at).await {
            Ok(achievement) => Some(achievement),
            Err(e) => {
                warn!(
                    user = %user,
                    kind = %request.achievement_type,
                    title = %request.title,
                    error = %e,
                    "achievement issuance failed"
                );
                None
            }
        }
    }

    /// Issue the streak achievement a fresh credit earned, if any.
    ///
    /// Duplicate credits earn nothing. Best effort, like [`Self::issue_best_effort`].
    pub async fn issue_for_credit(
        &self,
        outcome: &CreditOutcome,
        milestones: &[u32],
        at: DateTime<Utc>,
    ) -> Option<Achievement> {
        let CreditOutcome::Applied { record, streak } = outcome else {
            return None;
        };
        let request = check_streak_milestone(record, *streak, milestones)?;
        self.issue_best_effort(&record.user_id, &request, at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: AchievementType, badge_index: usize) -> AchievementRequest {
        AchievementRequest {
            achievement_type: kind,
            title: "Network Basics".to_string(),
            description: "Finished the networking module".to_string(),
            xp_earned: 50,
            badge_index,
        }
    }

    #[test]
    fn test_mint_picks_badge_and_token() {
        let user = UserId::new("u1").unwrap();
        let a = AchievementIssuer::mint(&user, &request(AchievementType::ModuleCompletion, 1), Utc::now()).unwrap();
        assert_eq!(a.badge_name, "Port Scanner");
        assert_eq!(a.badge_icon, "🔍");
        assert_eq!(a.share_token.len(), 32);

        let b = AchievementIssuer::mint(&user, &request(AchievementType::ModuleCompletion, 1), Utc::now()).unwrap();
        assert_ne!(a.share_token, b.share_token);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_mint_clamps_badge_index() {
        let user = UserId::new("u1").unwrap();
        let a = AchievementIssuer::mint(&user, &request(AchievementType::ModuleCompletion, 99), Utc::now()).unwrap();
        assert_eq!(a.badge_name, "Cyber Sentinel");
    }

    #[test]
    fn test_mint_rejects_bad_input() {
        let user = UserId::new("u1").unwrap();
        let mut req = request(AchievementType::Referral, 0);
        req.title = "  ".to_string();
        assert!(matches!(
            AchievementIssuer::mint(&user, &req, Utc::now()),
            Err(ProgressError::Validation(_))
        ));

        let mut req = request(AchievementType::Referral, 0);
        req.xp_earned = -5;
        assert!(matches!(
            AchievementIssuer::mint(&user, &req, Utc::now()),
            Err(ProgressError::Validation(_))
        ));
    }
}
