//! Store failures, partial credits and reconciliation

mod common;

use std::sync::Arc;

use chrono::Duration;

use common::{engine_with_clock, morning, temp_store, user, xp, FlakyStore};
use cyberlearn::{AchievementType, CreditSource, ProgressError, Track};

#[tokio::test]
async fn test_completion_store_failure_records_nothing() {
    let (_dir, store) = temp_store();
    let flaky = Arc::new(FlakyStore::new(store));
    let (engine, _clock) = engine_with_clock(flaky.clone());
    let alice = user("alice");

    FlakyStore::set(&flaky.fail_completions, true);
    let err = engine.complete_lesson(&alice, "web-1", 20, Track::Learning).await.unwrap_err();
    assert!(matches!(err, ProgressError::StoreUnavailable(_)));
    assert!(err.is_retryable());

    FlakyStore::set(&flaky.fail_completions, false);
    assert!(engine.pending_credits(10).await.unwrap().is_empty());
    assert!(engine.complete_lesson(&alice, "web-1", 20, Track::Learning).await.unwrap());
    assert_eq!(xp(&engine, &alice, Track::Learning).await, 20);
}

#[tokio::test]
async fn test_credit_failure_is_reported_and_repaired() {
    let (_dir, store) = temp_store();
    let flaky = Arc::new(FlakyStore::new(store));
    let (engine, clock) = engine_with_clock(flaky.clone());
    let bob = user("bob");

    FlakyStore::set(&flaky.fail_credits, true);
    let err = engine.complete_lesson(&bob, "forensics-3", 35, Track::Academic).await.unwrap_err();
    match &err {
        ProgressError::PartialFailure { user, source_key, xp, .. } => {
            assert_eq!(user, &bob);
            assert_eq!(source_key, &CreditSource::Lesson("forensics-3".to_string()));
            assert_eq!(*xp, 35);
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }

    // The gap is observable
    let pending = engine.pending_credits(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, bob);
    assert_eq!(pending[0].track, Track::Academic);
    assert_eq!(pending[0].xp, 35);
    assert_eq!(pending[0].completed_at, morning());

    // A client retry sees the completion and credits nothing by itself
    FlakyStore::set(&flaky.fail_credits, false);
    assert!(!engine.complete_lesson(&bob, "forensics-3", 35, Track::Academic).await.unwrap());
    assert_eq!(xp(&engine, &bob, Track::Academic).await, 0);

    clock.advance(Duration::days(2));
    let report = engine.reconcile(10).await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.repaired, 1);
    assert_eq!(report.failed, 0);

    let record = engine.progress(&bob, Track::Academic).await.unwrap().unwrap();
    assert_eq!(record.xp_points, 35);
    // Credited on the day the lesson was done
    assert_eq!(record.last_activity_at, morning());

    let again = engine.reconcile(10).await.unwrap();
    assert_eq!(again.scanned, 0);
    assert_eq!(xp(&engine, &bob, Track::Academic).await, 35);
}

#[tokio::test]
async fn test_failed_repair_stays_pending() {
    let (_dir, store) = temp_store();
    let flaky = Arc::new(FlakyStore::new(store));
    let (engine, _clock) = engine_with_clock(flaky.clone());
    let carol = user("carol");

    FlakyStore::set(&flaky.fail_credits, true);
    assert!(engine
        .complete_daily_challenge(&carol, "dc-7", false, 30, Track::Career)
        .await
        .is_err());

    let report = engine.reconcile(10).await.unwrap();
    assert_eq!((report.scanned, report.repaired, report.failed), (1, 0, 1));
    assert_eq!(engine.pending_credits(10).await.unwrap().len(), 1);

    FlakyStore::set(&flaky.fail_credits, false);
    let report = engine.reconcile(10).await.unwrap();
    assert_eq!(report.repaired, 1);
    assert_eq!(xp(&engine, &carol, Track::Career).await, 10);
}

#[tokio::test]
async fn test_reconcile_respects_limit_and_order() {
    let (_dir, store) = temp_store();
    let flaky = Arc::new(FlakyStore::new(store));
    let (engine, clock) = engine_with_clock(flaky.clone());
    let dave = user("dave");

    FlakyStore::set(&flaky.fail_credits, true);
    for i in 0..3 {
        let lesson = format!("l{i}");
        let _ = engine.complete_lesson(&dave, &lesson, 10, Track::Learning).await;
        clock.advance(Duration::minutes(5));
    }
    let _ = engine.complete_daily_challenge(&dave, "dc", true, 7, Track::Learning).await;
    FlakyStore::set(&flaky.fail_credits, false);

    let pending = engine.pending_credits(2).await.unwrap();
    let keys: Vec<_> = pending.iter().map(|p| p.source.key()).collect();
    assert_eq!(keys, vec!["lesson:l0", "lesson:l1"]);

    let report = engine.reconcile(2).await.unwrap();
    assert_eq!(report.repaired, 2);
    let report = engine.reconcile(10).await.unwrap();
    assert_eq!(report.repaired, 2);
    assert_eq!(xp(&engine, &dave, Track::Learning).await, 37);
}

#[tokio::test]
async fn test_achievement_failure_never_blocks_credit() {
    let (_dir, store) = temp_store();
    let flaky = Arc::new(FlakyStore::new(store));
    let (engine, clock) = engine_with_clock(flaky.clone());
    let eve = user("eve");

    FlakyStore::set(&flaky.fail_achievements, true);
    for day in 0..3 {
        clock.set(morning() + Duration::days(day));
        let lesson = format!("malware-{day}");
        assert!(engine.complete_lesson(&eve, &lesson, 15, Track::Learning).await.unwrap());
    }

    let record = engine.progress(&eve, Track::Learning).await.unwrap().unwrap();
    assert_eq!(record.xp_points, 45);
    assert_eq!(record.streak_days, 3);
    assert!(engine.list_achievements(&eve).await.unwrap().is_empty());

    // Requested directly, the failure is the caller's to see
    let err = engine
        .issue_achievement(&eve, AchievementType::CourseCompletion, "Malware 101", "", 100, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::AchievementIssuance(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_reconciled_credit_issues_streak_milestone() {
    let (_dir, store) = temp_store();
    let flaky = Arc::new(FlakyStore::new(store));
    let (engine, clock) = engine_with_clock(flaky.clone());
    let finn = user("finn");

    for day in 0..2 {
        clock.set(morning() + Duration::days(day));
        let lesson = format!("osint-{day}");
        assert!(engine.complete_lesson(&finn, &lesson, 10, Track::Learning).await.unwrap());
    }

    // Third day's credit is interrupted
    clock.set(morning() + Duration::days(2));
    FlakyStore::set(&flaky.fail_credits, true);
    assert!(engine.complete_lesson(&finn, "osint-2", 10, Track::Learning).await.is_err());
    FlakyStore::set(&flaky.fail_credits, false);
    assert!(engine.list_achievements(&finn).await.unwrap().is_empty());

    clock.set(morning() + Duration::days(2) + Duration::hours(3));
    let report = engine.reconcile(10).await.unwrap();
    assert_eq!(report.repaired, 1);

    let record = engine.progress(&finn, Track::Learning).await.unwrap().unwrap();
    assert_eq!((record.streak_days, record.longest_streak), (3, 3));

    let achievements = engine.list_achievements(&finn).await.unwrap();
    assert_eq!(achievements.len(), 1);
    assert_eq!(achievements[0].achievement_type, AchievementType::Streak);
    assert_eq!(achievements[0].badge_name, "Warming Up");
    assert_eq!(achievements[0].created_at, morning() + Duration::days(2));

    // Nothing left to repair, nothing issued twice
    engine.reconcile(10).await.unwrap();
    assert_eq!(engine.list_achievements(&finn).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_oversized_limit_is_not_a_store_failure() {
    let (_dir, store) = temp_store();
    let flaky = Arc::new(FlakyStore::new(store));
    let (engine, _clock) = engine_with_clock(flaky.clone());
    let gus = user("gus");

    FlakyStore::set(&flaky.fail_credits, true);
    let _ = engine.complete_lesson(&gus, "ids-1", 10, Track::Career).await;
    FlakyStore::set(&flaky.fail_credits, false);

    assert_eq!(engine.pending_credits(usize::MAX).await.unwrap().len(), 1);
    let report = engine.reconcile(usize::MAX).await.unwrap();
    assert_eq!(report.repaired, 1);
}
