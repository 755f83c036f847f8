//! Configuration loading and management

mod io;
mod settings;

pub use settings::{AchievementSettings, ReconcileSettings, StoreSettings};

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::progress::EngineOptions;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Progress database settings
    #[serde(default)]
    pub store: StoreSettings,

    /// Milestone achievement settings
    #[serde(default)]
    pub achievements: AchievementSettings,

    /// Reconciliation settings
    #[serde(default)]
    pub reconcile: ReconcileSettings,
}

impl Config {
    /// Database path, falling back to ~/.cyberlearn/progress.db
    pub fn database_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("progress.db"))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.store.busy_timeout_ms)
    }

    /// Engine options derived from this config
    pub fn engine_options(&self) -> EngineOptions {
        let mut milestones = self.achievements.streak_milestones.clone();
        milestones.sort_unstable();
        milestones.dedup();
        milestones.retain(|&m| m > 0);
        EngineOptions {
            streak_milestones: milestones,
        }
    }
}
