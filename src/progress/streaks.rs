//! Streak tracking
//!
//! Streaks count consecutive calendar days with activity on one (user, track)
//! record. Days are cut at midnight UTC for every user and every server, so a
//! given pair of timestamps always yields the same gap.

use chrono::{DateTime, NaiveDate, Utc};

use super::models::UserProgressRecord;

/// Streak fields carried on a progress record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    pub last_activity_at: DateTime<Utc>,
}

impl From<&UserProgressRecord> for StreakState {
    fn from(record: &UserProgressRecord) -> Self {
        Self {
            current: record.streak_days,
            longest: record.longest_streak,
            last_activity_at: record.last_activity_at,
        }
    }
}

/// What an activity did to the streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// First activity on the record
    Started,
    /// Another activity on the same day
    Unchanged,
    /// Activity on the day after the last one
    Extended,
    /// Activity after a gap of two or more days
    Reset,
    /// Activity dated before the last one; ignored
    ClockSkew,
}

impl StreakChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Unchanged => "unchanged",
            Self::Extended => "extended",
            Self::Reset => "reset",
            Self::ClockSkew => "clock_skew",
        }
    }
}

/// Calendar day of a timestamp
pub fn activity_day(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Whole calendar days from `previous` to `now` (negative if `now` is earlier)
pub fn days_between(previous: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (activity_day(now) - activity_day(previous)).num_days()
}

/// Day-gap streak arithmetic
pub struct StreakEngine;

impl StreakEngine {
    /// Compute the streak after an activity at `now`.
    ///
    /// The stored timestamp only moves when the day changes forward: a
    /// same-day repeat keeps the earlier timestamp and an out-of-order
    /// activity never rewinds it.
    pub fn advance(previous: Option<StreakState>, now: DateTime<Utc>) -> (StreakState, StreakChange) {
        let Some(prev) = previous else {
            let state = StreakState {
                current: 1,
                longest: 1,
                last_activity_at: now,
            };
            return (state, StreakChange::Started);
        };

        let diff = days_between(prev.last_activity_at, now);
        let (current, change) = match diff {
            0 => return (prev, StreakChange::Unchanged),
            d if d < 0 => return (prev, StreakChange::ClockSkew),
            1 => (prev.current.saturating_add(1), StreakChange::Extended),
            _ => (1, StreakChange::Reset),
        };

        // A stored zero can only come from a hand-edited row; treat it as one day.
        let current = current.max(1);
        let state = StreakState {
            current,
            longest: prev.longest.max(current),
            last_activity_at: now,
        };
        (state, change)
    }

    /// Whether the streak still counts as live at `now` (activity today or yesterday)
    pub fn is_active(state: &StreakState, now: DateTime<Utc>) -> bool {
        (0..=1).contains(&days_between(state.last_activity_at, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn state(current: u32, last: DateTime<Utc>) -> StreakState {
        StreakState {
            current,
            longest: current,
            last_activity_at: last,
        }
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let now = at(2026, 10, 18, 9);
        let (s, change) = StreakEngine::advance(None, now);
        assert_eq!(change, StreakChange::Started);
        assert_eq!(s.current, 1);
        assert_eq!(s.last_activity_at, now);
    }

    #[test]
    fn test_same_day_keeps_streak_and_timestamp() {
        let morning = at(2026, 10, 18, 9);
        let evening = at(2026, 10, 18, 18);
        let (s, change) = StreakEngine::advance(Some(state(4, morning)), evening);
        assert_eq!(change, StreakChange::Unchanged);
        assert_eq!(s.current, 4);
        assert_eq!(s.last_activity_at, morning);
    }

    #[test]
    fn test_consecutive_day_extends_by_one() {
        let yesterday = at(2026, 10, 17, 23);
        let today = at(2026, 10, 18, 0);
        let (s, change) = StreakEngine::advance(Some(state(4, yesterday)), today);
        assert_eq!(change, StreakChange::Extended);
        assert_eq!(s.current, 5);
        assert_eq!(s.longest, 5);
        assert_eq!(s.last_activity_at, today);
    }

    #[test]
    fn test_gap_resets_to_one() {
        let now = at(2026, 10, 18, 12);
        let five_days_ago = now - Duration::days(5);
        let (s, change) = StreakEngine::advance(Some(state(9, five_days_ago)), now);
        assert_eq!(change, StreakChange::Reset);
        assert_eq!(s.current, 1);
        assert_eq!(s.longest, 9);
        assert_eq!(s.last_activity_at, now);
    }

    #[test]
    fn test_two_day_gap_resets() {
        let (s, change) =
            StreakEngine::advance(Some(state(3, at(2026, 10, 16, 20))), at(2026, 10, 18, 1));
        assert_eq!(change, StreakChange::Reset);
        assert_eq!(s.current, 1);
    }

    #[test]
    fn test_out_of_order_activity_is_ignored() {
        let last = at(2026, 10, 18, 9);
        let earlier = at(2026, 10, 16, 9);
        let prev = state(6, last);
        let (s, change) = StreakEngine::advance(Some(prev), earlier);
        assert_eq!(change, StreakChange::ClockSkew);
        assert_eq!(s, prev);
    }

    #[test]
    fn test_day_boundary_is_utc_midnight() {
        // 23:59 and 00:01 UTC are one day apart even though only minutes passed
        let before = Utc.with_ymd_and_hms(2026, 10, 17, 23, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 10, 18, 0, 1, 0).unwrap();
        assert_eq!(days_between(before, after), 1);
        assert_eq!(days_between(after, before), -1);
    }

    #[test]
    fn test_longest_streak_survives_reset() {
        let mut s = state(1, at(2026, 10, 1, 8));
        for day in 2..=4 {
            s = StreakEngine::advance(Some(s), at(2026, 10, day, 8)).0;
        }
        assert_eq!((s.current, s.longest), (4, 4));
        s = StreakEngine::advance(Some(s), at(2026, 10, 10, 8)).0;
        assert_eq!((s.current, s.longest), (1, 4));
    }

    #[test]
    fn test_is_active() {
        let s = state(2, at(2026, 10, 17, 22));
        assert!(StreakEngine::is_active(&s, at(2026, 10, 18, 10)));
        assert!(!StreakEngine::is_active(&s, at(2026, 10, 19, 10)));
    }
}
