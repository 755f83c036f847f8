//! Milestone checks run after a successful credit

use super::issuer::AchievementRequest;
use crate::progress::models::{AchievementType, UserProgressRecord};
use crate::progress::streaks::StreakChange;

/// Default streak lengths that earn a streak achievement
pub const DEFAULT_STREAK_MILESTONES: &[u32] = &[3, 7, 14, 30];

/// Check whether a credit moved the streak onto a milestone.
///
/// Only a streak at a new personal best counts, so climbing back to a
/// milestone after a reset does not issue the badge again.
pub fn check_streak_milestone(
    record: &UserProgressRecord,
    change: StreakChange,
    milestones: &[u32],
) -> Option<AchievementRequest> {
    if !matches!(change, StreakChange::Started | StreakChange::Extended) {
        return None;
    }
    if record.streak_days != record.longest_streak {
        return None;
    }

    let tier = milestones.iter().position(|&m| m == record.streak_days)?;
    let days = record.streak_days;
    Some(AchievementRequest {
        achievement_type: AchievementType::Streak,
        title: format!("{days}-Day Streak"),
        description: format!(
            "Active {days} days in a row on the {} track",
            record.track.label()
        ),
        xp_earned: 0,
        badge_index: tier,
    })
}
