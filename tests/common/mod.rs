//! Shared test utilities for progress engine tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use cyberlearn::{
    Achievement, CompletionOutcome, CompletionRecord, CreditOutcome, EngineOptions, FixedClock,
    PendingCredit, ProgressEngine, ProgressStore, SqliteStore, StoreError, StoreResult, Track,
    UserId, UserProgressRecord, XpCredit,
};

/// 2026-10-18 09:00 UTC
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

/// Creates a SQLite store in a fresh temporary directory
pub fn temp_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::open(&dir.path().join("progress.db")).expect("Failed to open store");
    (dir, store)
}

/// Engine on `store` driven by a manual clock starting at [`morning`]
pub fn engine_with_clock(store: Arc<dyn ProgressStore>) -> (ProgressEngine, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(morning()));
    let engine = ProgressEngine::with_options(store, clock.clone(), EngineOptions::default());
    (engine, clock)
}

pub async fn xp(engine: &ProgressEngine, user: &UserId, track: Track) -> u64 {
    engine
        .progress(user, track)
        .await
        .expect("progress lookup")
        .map(|r| r.xp_points)
        .unwrap_or(0)
}

/// Store wrapper that fails selected operations on demand
pub struct FlakyStore {
    inner: SqliteStore,
    pub fail_completions: AtomicBool,
    pub fail_credits: AtomicBool,
    pub fail_achievements: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            fail_completions: AtomicBool::new(false),
            fail_credits: AtomicBool::new(false),
            fail_achievements: AtomicBool::new(false),
        }
    }

    pub fn set(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected {what} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for FlakyStore {
    async fn insert_completion(&self, record: &CompletionRecord) -> StoreResult<CompletionOutcome> {
        Self::check(&self.fail_completions, "completion")?;
        self.inner.insert_completion(record).await
    }

    async fn apply_credit(&self, credit: &XpCredit) -> StoreResult<CreditOutcome> {
        Self::check(&self.fail_credits, "credit")?;
        self.inner.apply_credit(credit).await
    }

    async fn progress(&self, user: &UserId, track: Track) -> StoreResult<Option<UserProgressRecord>> {
        self.inner.progress(user, track).await
    }

    async fn progress_for_user(&self, user: &UserId) -> StoreResult<Vec<UserProgressRecord>> {
        self.inner.progress_for_user(user).await
    }

    async fn append_achievement(&self, achievement: &Achievement) -> StoreResult<()> {
        Self::check(&self.fail_achievements, "achievement")?;
        self.inner.append_achievement(achievement).await
    }

    async fn list_achievements(&self, user: &UserId) -> StoreResult<Vec<Achievement>> {
        self.inner.list_achievements(user).await
    }

    async fn pending_credits(&self, limit: usize) -> StoreResult<Vec<PendingCredit>> {
        self.inner.pending_credits(limit).await
    }
}
