//! Achievements: badge tables, issuance and milestone checks

mod definitions;
mod issuer;
mod milestones;

pub use definitions::{badge_for, badges_for, Badge};
pub use issuer::{AchievementIssuer, AchievementRequest};
pub use milestones::{check_streak_milestone, DEFAULT_STREAK_MILESTONES};
