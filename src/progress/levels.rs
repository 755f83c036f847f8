//! XP and Level system
//!
//! Defines level thresholds and titles. Levels are derived from total XP
//! across all tracks and never stored.

use serde::Serialize;

/// Level definition
#[derive(Debug, Clone)]
pub struct Level {
    pub level: u32,
    pub xp_required: u64,
    pub title: &'static str,
}

/// All level definitions (must be sorted by level)
pub static LEVELS: &[Level] = &[
    Level { level: 1, xp_required: 0, title: "Recruit" },
    Level { level: 2, xp_required: 100, title: "Recruit" },
    Level { level: 3, xp_required: 250, title: "Analyst" },
    Level { level: 4, xp_required: 500, title: "Analyst" },
    Level { level: 5, xp_required: 900, title: "Defender" },
    Level { level: 6, xp_required: 1400, title: "Defender" },
    Level { level: 7, xp_required: 2000, title: "Threat Hunter" },
    Level { level: 8, xp_required: 2800, title: "Threat Hunter" },
    Level { level: 9, xp_required: 3800, title: "Incident Responder" },
    Level { level: 10, xp_required: 5000, title: "Incident Responder" },
    Level { level: 11, xp_required: 6500, title: "Red Teamer" },
    Level { level: 12, xp_required: 8500, title: "Red Teamer" },
    Level { level: 13, xp_required: 11000, title: "Security Architect" },
    Level { level: 14, xp_required: 14000, title: "Security Architect" },
    Level { level: 15, xp_required: 18000, title: "CISO" },
];

impl Level {
    /// Calculate level and title for given XP
    pub fn for_xp(xp: u64) -> &'static Level {
        LEVELS
            .iter()
            .rev()
            .find(|l| xp >= l.xp_required)
            .unwrap_or(&LEVELS[0])
    }

    /// Get XP needed for next level (None if max level)
    pub fn xp_for_next(current_level: u32) -> Option<u64> {
        LEVELS
            .iter()
            .find(|l| l.level == current_level + 1)
            .map(|l| l.xp_required)
    }
}

/// Level standing for a total XP figure
#[derive(Debug, Clone, Default, Serialize)]
pub struct LevelStanding {
    pub total_xp: u64,
    pub level: u32,
    pub title: String,
    pub current_level_xp: u64,
    pub next_level_xp: Option<u64>,
}

impl LevelStanding {
    pub fn new(total_xp: u64) -> Self {
        let info = Level::for_xp(total_xp);
        Self {
            total_xp,
            level: info.level,
            title: info.title.to_string(),
            current_level_xp: info.xp_required,
            next_level_xp: Level::xp_for_next(info.level),
        }
    }

    /// Progress to next level (0.0 - 1.0)
    pub fn progress_to_next(&self) -> f32 {
        match self.next_level_xp {
            Some(next) => {
                let span = next - self.current_level_xp;
                if span == 0 {
                    1.0
                } else {
                    (self.total_xp - self.current_level_xp) as f32 / span as f32
                }
            }
            None => 1.0,
        }
    }
}
