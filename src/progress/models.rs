//! Data models for progress tracking
//!
//! These structures represent the records stored in and read back from the
//! progress store. Timestamps are UTC throughout.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ProgressError;

/// Opaque identifier of an authenticated user.
///
/// Supplied by the identity provider on every call; the engine never looks
/// it up or stores session state of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct UserId(String);

impl UserId {
    /// Build a user id, rejecting empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Result<Self, ProgressError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProgressError::Validation("user id is missing".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ProgressError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Guidance mode under which XP and streaks are tracked independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Learning,
    Mentorship,
    ExamPrep,
    Siwes,
    Academic,
    Career,
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Mentorship => "mentorship",
            Self::ExamPrep => "exam_prep",
            Self::Siwes => "siwes",
            Self::Academic => "academic",
            Self::Career => "career",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "learning" => Some(Self::Learning),
            "mentorship" => Some(Self::Mentorship),
            "exam_prep" => Some(Self::ExamPrep),
            "siwes" => Some(Self::Siwes),
            "academic" => Some(Self::Academic),
            "career" => Some(Self::Career),
            _ => None,
        }
    }

    pub fn all() -> &'static [Track] {
        &[
            Self::Learning,
            Self::Mentorship,
            Self::ExamPrep,
            Self::Siwes,
            Self::Academic,
            Self::Career,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Learning => "Learning",
            Self::Mentorship => "Mentorship",
            Self::ExamPrep => "Exam Prep",
            Self::Siwes => "SIWES",
            Self::Academic => "Academic",
            Self::Career => "Career",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// XP balance and activity streak for one (user, track)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgressRecord {
    pub user_id: UserId,
    pub track: Track,
    pub xp_points: u64,
    pub streak_days: u32,
    pub longest_streak: u32,
    pub last_activity_at: DateTime<Utc>,
}

/// Marker that a lesson has been credited for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonCompletion {
    pub user_id: UserId,
    pub lesson_id: String,
    pub track: Track,
    pub xp_earned: u64,
    pub created_at: DateTime<Utc>,
}

/// Marker that a daily challenge has been answered by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChallengeCompletion {
    pub user_id: UserId,
    pub challenge_id: String,
    pub track: Track,
    pub was_correct: bool,
    pub xp_earned: u64,
    pub created_at: DateTime<Utc>,
}

/// A one-time completion guarded by a unique (user, item) key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionRecord {
    Lesson(LessonCompletion),
    DailyChallenge(DailyChallengeCompletion),
}

impl CompletionRecord {
    pub fn user_id(&self) -> &UserId {
        match self {
            Self::Lesson(c) => &c.user_id,
            Self::DailyChallenge(c) => &c.user_id,
        }
    }

    pub fn track(&self) -> Track {
        match self {
            Self::Lesson(c) => c.track,
            Self::DailyChallenge(c) => c.track,
        }
    }

    pub fn xp_earned(&self) -> u64 {
        match self {
            Self::Lesson(c) => c.xp_earned,
            Self::DailyChallenge(c) => c.xp_earned,
        }
    }

    /// The ledger source this completion is credited under
    pub fn credit_source(&self) -> CreditSource {
        match self {
            Self::Lesson(c) => CreditSource::Lesson(c.lesson_id.clone()),
            Self::DailyChallenge(c) => CreditSource::DailyChallenge(c.challenge_id.clone()),
        }
    }
}

/// Result of a guarded completion insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Created,
    /// The unique key already existed; nothing was written
    AlreadyCompleted,
}

impl CompletionOutcome {
    pub fn created(&self) -> bool {
        matches!(self, Self::Created)
    }
}

/// The event an XP credit belongs to.
///
/// A ledger holds at most one credit per (user, source), which is what makes
/// crediting exactly-once under retries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CreditSource {
    Lesson(String),
    DailyChallenge(String),
    /// Ad-hoc award with a caller-generated id
    Manual(String),
}

impl CreditSource {
    pub fn key(&self) -> String {
        match self {
            Self::Lesson(id) => format!("lesson:{id}"),
            Self::DailyChallenge(id) => format!("challenge:{id}"),
            Self::Manual(id) => format!("manual:{id}"),
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let (kind, id) = key.split_once(':')?;
        match kind {
            "lesson" => Some(Self::Lesson(id.to_string())),
            "challenge" => Some(Self::DailyChallenge(id.to_string())),
            "manual" => Some(Self::Manual(id.to_string())),
            _ => None,
        }
    }
}

/// A validated XP credit ready to be applied by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpCredit {
    pub user_id: UserId,
    pub track: Track,
    pub source: CreditSource,
    pub delta: u64,
    pub at: DateTime<Utc>,
}

/// Kind of award an achievement represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementType {
    ModuleCompletion,
    AssessmentPass,
    DailyChallenge,
    CourseCompletion,
    Streak,
    Referral,
}

impl AchievementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModuleCompletion => "module_completion",
            Self::AssessmentPass => "assessment_pass",
            Self::DailyChallenge => "daily_challenge",
            Self::CourseCompletion => "course_completion",
            Self::Streak => "streak",
            Self::Referral => "referral",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "module_completion" => Some(Self::ModuleCompletion),
            "assessment_pass" => Some(Self::AssessmentPass),
            "daily_challenge" => Some(Self::DailyChallenge),
            "course_completion" => Some(Self::CourseCompletion),
            "streak" => Some(Self::Streak),
            "referral" => Some(Self::Referral),
            _ => None,
        }
    }
}

impl fmt::Display for AchievementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issued achievement. Append-only, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub user_id: UserId,
    pub achievement_type: AchievementType,
    pub title: String,
    pub description: String,
    pub badge_name: String,
    pub badge_icon: String,
    pub xp_earned: u64,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
}

/// A completion whose credit never reached the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingCredit {
    pub user_id: UserId,
    pub track: Track,
    #[serde(serialize_with = "serialize_source")]
    pub source: CreditSource,
    pub xp: u64,
    pub completed_at: DateTime<Utc>,
}

fn serialize_source<S: serde::Serializer>(source: &CreditSource, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&source.key())
}
