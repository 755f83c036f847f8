//! SQLite-backed progress store
//!
//! Uniqueness lives in primary keys, so duplicate completions are rejected by
//! the database itself. Credits run inside `BEGIN IMMEDIATE` transactions,
//! which take the write lock up front and make ledger insert, XP increment and
//! streak step a single step for every writer sharing the file.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::{CreditOutcome, ProgressStore};
use crate::progress::error::{StoreError, StoreResult};
use crate::progress::models::{
    Achievement, AchievementType, CompletionOutcome, CompletionRecord, CreditSource,
    PendingCredit, Track, UserId, UserProgressRecord, XpCredit,
};
use crate::progress::streaks::{StreakEngine, StreakState};

/// Default time a writer waits for the database lock
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Progress store on a single SQLite database file
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the progress database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open or create the progress database with a custom busy timeout
    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create progress dir: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open progress db: {}", path.display()))?;

        // WAL lets the CLI read while a service process writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(busy_timeout)?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory progress db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialise progress schema")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run blocking database work off the async executor
    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("progress db lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("store task failed: {e}")))?
    }
}

#[async_trait]
impl ProgressStore for SqliteStore {
    async fn insert_completion(&self, record: &CompletionRecord) -> StoreResult<CompletionOutcome> {
        let record = record.clone();
        self.run(move |conn| {
            let inserted = match &record {
                CompletionRecord::Lesson(c) => conn.execute(
                    r#"INSERT INTO lesson_completions (user_id, lesson_id, track, xp_earned, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5)
                       ON CONFLICT(user_id, lesson_id) DO NOTHING"#,
                    params![
                        c.user_id.as_str(),
                        c.lesson_id,
                        c.track.as_str(),
                        c.xp_earned,
                        c.created_at.timestamp_millis(),
                    ],
                )?,
                CompletionRecord::DailyChallenge(c) => conn.execute(
                    r#"INSERT INTO daily_challenge_completions
                       (user_id, challenge_id, track, was_correct, xp_earned, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                       ON CONFLICT(user_id, challenge_id) DO NOTHING"#,
                    params![
                        c.user_id.as_str(),
                        c.challenge_id,
                        c.track.as_str(),
                        c.was_correct as i32,
                        c.xp_earned,
                        c.created_at.timestamp_millis(),
                    ],
                )?,
            };

            Ok(if inserted == 0 {
                CompletionOutcome::AlreadyCompleted
            } else {
                CompletionOutcome::Created
            })
        })
        .await
    }

    async fn apply_credit(&self, credit: &XpCredit) -> StoreResult<CreditOutcome> {
        let credit = credit.clone();
        self.run(move |conn| apply_credit_tx(conn, &credit)).await
    }

    async fn progress(&self, user: &UserId, track: Track) -> StoreResult<Option<UserProgressRecord>> {
        let user = user.clone();
        self.run(move |conn| load_progress(conn, &user, track)).await
    }

    async fn progress_for_user(&self, user: &UserId) -> StoreResult<Vec<UserProgressRecord>> {
        let user = user.clone();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                r#"SELECT track, xp_points, streak_days, longest_streak, last_activity_at
                   FROM user_progress WHERE user_id = ?1 ORDER BY track"#,
            )?;
            let rows: Vec<ProgressRow> = stmt
                .query_map(params![user.as_str()], ProgressRow::from_row)?
                .collect::<rusqlite::Result<_>>()?;
            rows.into_iter().map(|r| r.into_record(&user)).collect()
        })
        .await
    }

    async fn append_achievement(&self, achievement: &Achievement) -> StoreResult<()> {
        let a = achievement.clone();
        self.run(move |conn| {
            conn.execute(
                r#"INSERT INTO achievements
                   (id, user_id, achievement_type, title, description, badge_name, badge_icon,
                    xp_earned, share_token, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
                params![
                    a.id,
                    a.user_id.as_str(),
                    a.achievement_type.as_str(),
                    a.title,
                    a.description,
                    a.badge_name,
                    a.badge_icon,
                    a.xp_earned,
                    a.share_token,
                    a.created_at.timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_achievements(&self, user: &UserId) -> StoreResult<Vec<Achievement>> {
        let user = user.clone();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                r#"SELECT id, achievement_type, title, description, badge_name, badge_icon,
                          xp_earned, share_token, created_at
                   FROM achievements WHERE user_id = ?1
                   ORDER BY created_at DESC, rowid DESC"#,
            )?;
            let rows = stmt
                .query_map(params![user.as_str()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, u64>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, i64>(8)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(id, kind, title, description, badge_name, badge_icon, xp, token, ts)| {
                    let achievement_type = AchievementType::from_str(&kind)
                        .ok_or_else(|| StoreError::Corrupt(format!("unknown achievement type {kind:?}")))?;
                    Ok(Achievement {
                        id,
                        user_id: user.clone(),
                        achievement_type,
                        title,
                        description,
                        badge_name,
                        badge_icon,
                        xp_earned: xp,
                        share_token: token,
                        created_at: millis_to_utc(ts)?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn pending_credits(&self, limit: usize) -> StoreResult<Vec<PendingCredit>> {
        // SQLite limits are i64
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                r#"SELECT c.user_id, c.track, 'lesson:' || c.lesson_id, c.xp_earned, c.created_at
                   FROM lesson_completions c
                   LEFT JOIN xp_ledger l
                     ON l.user_id = c.user_id AND l.source_key = 'lesson:' || c.lesson_id
                   WHERE l.user_id IS NULL
                   UNION ALL
                   SELECT c.user_id, c.track, 'challenge:' || c.challenge_id, c.xp_earned, c.created_at
                   FROM daily_challenge_completions c
                   LEFT JOIN xp_ledger l
                     ON l.user_id = c.user_id AND l.source_key = 'challenge:' || c.challenge_id
                   WHERE l.user_id IS NULL
                   ORDER BY 5 ASC
                   LIMIT ?1"#,
            )?;
            let rows = stmt
                .query_map(params![limit], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(user, track, key, xp, ts)| {
                    Ok(PendingCredit {
                        user_id: UserId::new(user)
                            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
                        track: parse_track(&track)?,
                        source: CreditSource::from_key(&key)
                            .ok_or_else(|| StoreError::Corrupt(format!("bad source key {key:?}")))?,
                        xp,
                        completed_at: millis_to_utc(ts)?,
                    })
                })
                .collect()
        })
        .await
    }
}

fn apply_credit_tx(conn: &mut Connection, credit: &XpCredit) -> StoreResult<CreditOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let source_key = credit.source.key();

    let inserted = tx.execute(
        r#"INSERT INTO xp_ledger (user_id, source_key, track, delta, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(user_id, source_key) DO NOTHING"#,
        params![
            credit.user_id.as_str(),
            source_key,
            credit.track.as_str(),
            credit.delta,
            credit.at.timestamp_millis(),
        ],
    )?;

    if inserted == 0 {
        // Report the record the original credit went to
        let track: String = tx.query_row(
            "SELECT track FROM xp_ledger WHERE user_id = ?1 AND source_key = ?2",
            params![credit.user_id.as_str(), source_key],
            |r| r.get(0),
        )?;
        let record = load_progress(&tx, &credit.user_id, parse_track(&track)?)?
            .ok_or_else(|| StoreError::Corrupt(format!("ledger entry {source_key} has no progress record")))?;
        tx.commit()?;
        debug!(user = %credit.user_id, source = %source_key, "credit already applied");
        return Ok(CreditOutcome::Duplicate { record });
    }

    let previous = load_progress(&tx, &credit.user_id, credit.track)?.map(|r| StreakState::from(&r));
    let (streak, change) = StreakEngine::advance(previous, credit.at);

    tx.execute(
        r#"INSERT INTO user_progress
           (user_id, track, xp_points, streak_days, longest_streak, last_activity_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT(user_id, track) DO UPDATE SET
               xp_points = xp_points + excluded.xp_points,
               streak_days = excluded.streak_days,
               longest_streak = excluded.longest_streak,
               last_activity_at = excluded.last_activity_at,
               updated_at = excluded.updated_at"#,
        params![
            credit.user_id.as_str(),
            credit.track.as_str(),
            credit.delta,
            streak.current,
            streak.longest,
            streak.last_activity_at.timestamp_millis(),
            credit.at.timestamp_millis(),
        ],
    )?;

    let record = load_progress(&tx, &credit.user_id, credit.track)?
        .ok_or_else(|| StoreError::Corrupt("progress record vanished inside transaction".to_string()))?;
    tx.commit()?;

    Ok(CreditOutcome::Applied {
        record,
        streak: change,
    })
}

struct ProgressRow {
    track: String,
    xp_points: u64,
    streak_days: u32,
    longest_streak: u32,
    last_activity_at: i64,
}

impl ProgressRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            track: row.get(0)?,
            xp_points: row.get(1)?,
            streak_days: row.get(2)?,
            longest_streak: row.get(3)?,
            last_activity_at: row.get(4)?,
        })
    }

    fn into_record(self, user: &UserId) -> StoreResult<UserProgressRecord> {
        Ok(UserProgressRecord {
            user_id: user.clone(),
            track: parse_track(&self.track)?,
            xp_points: self.xp_points,
            streak_days: self.streak_days,
            longest_streak: self.longest_streak,
            last_activity_at: millis_to_utc(self.last_activity_at)?,
        })
    }
}

fn load_progress(conn: &Connection, user: &UserId, track: Track) -> StoreResult<Option<UserProgressRecord>> {
    let row = conn
        .query_row(
            r#"SELECT track, xp_points, streak_days, longest_streak, last_activity_at
               FROM user_progress WHERE user_id = ?1 AND track = ?2"#,
            params![user.as_str(), track.as_str()],
            ProgressRow::from_row,
        )
        .optional()?;
    row.map(|r| r.into_record(user)).transpose()
}

fn parse_track(s: &str) -> StoreResult<Track> {
    Track::from_str(s).ok_or_else(|| StoreError::Corrupt(format!("unknown track {s:?}")))
}

fn millis_to_utc(ms: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {ms}")))
}

/// Run any pending migrations
fn run_migrations(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
        .unwrap_or(0);

    // Migration 2: longest_streak on progress records
    if version < 2 {
        let has_longest: bool = conn
            .prepare("SELECT COUNT(*) FROM pragma_table_info('user_progress') WHERE name = 'longest_streak'")
            .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
            .map(|c| c > 0)
            .unwrap_or(false);

        if !has_longest {
            conn.execute_batch(
                r#"
                ALTER TABLE user_progress ADD COLUMN longest_streak INTEGER NOT NULL DEFAULT 1;
                UPDATE user_progress SET longest_streak = streak_days;
                "#,
            )?;
        }
        conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
    }

    Ok(())
}

/// SQL schema for the progress database
const SCHEMA_SQL: &str = r#"
-- XP balance and streak per (user, track)
CREATE TABLE IF NOT EXISTS user_progress (
    user_id TEXT NOT NULL,
    track TEXT NOT NULL,
    xp_points INTEGER NOT NULL DEFAULT 0 CHECK (xp_points >= 0),
    streak_days INTEGER NOT NULL DEFAULT 1,
    longest_streak INTEGER NOT NULL DEFAULT 1,
    last_activity_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, track)
);

-- One row per credited lesson
CREATE TABLE IF NOT EXISTS lesson_completions (
    user_id TEXT NOT NULL,
    lesson_id TEXT NOT NULL,
    track TEXT NOT NULL,
    xp_earned INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, lesson_id)
);

-- One row per answered daily challenge
CREATE TABLE IF NOT EXISTS daily_challenge_completions (
    user_id TEXT NOT NULL,
    challenge_id TEXT NOT NULL,
    track TEXT NOT NULL,
    was_correct INTEGER NOT NULL,
    xp_earned INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, challenge_id)
);

-- Every applied credit, at most one per source
CREATE TABLE IF NOT EXISTS xp_ledger (
    user_id TEXT NOT NULL,
    source_key TEXT NOT NULL,
    track TEXT NOT NULL,
    delta INTEGER NOT NULL CHECK (delta >= 0),
    created_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, source_key)
);

-- Issued achievements (append-only)
CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    achievement_type TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    badge_name TEXT NOT NULL,
    badge_icon TEXT NOT NULL,
    xp_earned INTEGER NOT NULL DEFAULT 0,
    share_token TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_achievements_user ON achievements(user_id, created_at);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_and_init() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("progress.db")).unwrap();

        let conn = store.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in ["user_progress", "lesson_completions", "daily_challenge_completions", "xp_ledger", "achievements"] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn test_migration_adds_longest_streak() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE user_progress (
                user_id TEXT NOT NULL, track TEXT NOT NULL,
                xp_points INTEGER NOT NULL DEFAULT 0, streak_days INTEGER NOT NULL DEFAULT 1,
                last_activity_at INTEGER NOT NULL, updated_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, track)
            );
            INSERT INTO user_progress VALUES ('u1', 'learning', 40, 6, 0, 0);
            "#,
        )
        .unwrap();

        let store = SqliteStore::from_connection(conn).unwrap();
        let conn = store.conn.lock().unwrap();
        let longest: u32 = conn
            .query_row("SELECT longest_streak FROM user_progress WHERE user_id = 'u1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(longest, 6);
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.db");
        let user = UserId::new("u1").unwrap();
        let credit = XpCredit {
            user_id: user.clone(),
            track: Track::Career,
            source: CreditSource::Manual("m1".to_string()),
            delta: 15,
            at: Utc::now(),
        };

        SqliteStore::open(&path).unwrap().apply_credit(&credit).await.unwrap();

        let reopened = SqliteStore::open(&path).unwrap();
        let record = reopened.progress(&user, Track::Career).await.unwrap().unwrap();
        assert_eq!(record.xp_points, 15);
        assert!(!reopened.apply_credit(&credit).await.unwrap().applied());
    }
}
