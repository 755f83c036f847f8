//! Settings configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::progress::achievements::DEFAULT_STREAK_MILESTONES;

/// Progress database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file; defaults to ~/.cyberlearn/progress.db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// How long a writer waits for the database lock before giving up
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Milestone achievement settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementSettings {
    /// Streak lengths that issue a streak achievement. Position in the
    /// sorted list picks the badge tier.
    #[serde(default = "default_streak_milestones")]
    pub streak_milestones: Vec<u32>,
}

impl Default for AchievementSettings {
    fn default() -> Self {
        Self {
            streak_milestones: default_streak_milestones(),
        }
    }
}

fn default_streak_milestones() -> Vec<u32> {
    DEFAULT_STREAK_MILESTONES.to_vec()
}

/// Reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSettings {
    /// Pending credits handled per pass
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    100
}
