//! Badge tables
//!
//! Each achievement type owns a fixed, ordered list of badges. Progressive
//! tiers index into the list; anything past the end gets the top badge.

use crate::progress::models::AchievementType;

/// A badge shown on an issued achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub name: &'static str,
    pub icon: &'static str,
}

const fn badge(name: &'static str, icon: &'static str) -> Badge {
    Badge { name, icon }
}

static MODULE_COMPLETION: &[Badge] = &[
    badge("Packet Sniffer", "📡"),
    badge("Port Scanner", "🔍"),
    badge("Exploit Analyst", "🧪"),
    badge("Cyber Sentinel", "🛡️"),
];

static ASSESSMENT_PASS: &[Badge] = &[
    badge("Quiz Cracker", "✅"),
    badge("Assessment Ace", "🎯"),
    badge("Certified Defender", "🏅"),
    badge("Zero-Day Scholar", "🎓"),
];

static DAILY_CHALLENGE: &[Badge] = &[
    badge("Daily Recon", "☀️"),
    badge("Challenge Hunter", "🏹"),
    badge("Puzzle Breaker", "🧩"),
    badge("Capture the Flag", "🚩"),
];

static COURSE_COMPLETION: &[Badge] = &[
    badge("Course Graduate", "📘"),
    badge("Track Specialist", "📚"),
    badge("Security Scholar", "🏛️"),
    badge("Cyber Master", "🏆"),
];

static STREAK: &[Badge] = &[
    badge("Warming Up", "🔥"),
    badge("Week Warrior", "⚡"),
    badge("Fortnight Firewall", "🧱"),
    badge("Unbreakable", "💎"),
];

static REFERRAL: &[Badge] = &[
    badge("Recruiter", "🤝"),
    badge("Team Builder", "👥"),
    badge("Community Champion", "🌐"),
];

/// The ordered badge list for an achievement type
pub fn badges_for(kind: AchievementType) -> &'static [Badge] {
    match kind {
        AchievementType::ModuleCompletion => MODULE_COMPLETION,
        AchievementType::AssessmentPass => ASSESSMENT_PASS,
        AchievementType::DailyChallenge => DAILY_CHALLENGE,
        AchievementType::CourseCompletion => COURSE_COMPLETION,
        AchievementType::Streak => STREAK,
        AchievementType::Referral => REFERRAL,
    }
}

/// Pick the badge for a tier, clamped to the last entry
pub fn badge_for(kind: AchievementType, badge_index: usize) -> Badge {
    let table = badges_for(kind);
    table[badge_index.min(table.len() - 1)]
}
