//! XP, completion and reconciliation commands

use anyhow::Result;
use serde_json::json;

use cyberlearn::{daily_challenge_xp, Track, UserProgressRecord};

use super::{user_id, AppContext};

/// Credit XP outside any lesson or challenge
pub async fn award_command(ctx: &AppContext, user: &str, track: Track, amount: i64) -> Result<()> {
    let user = user_id(user)?;
    let credited = ctx.engine.award_xp(&user, track, amount).await?;
    let record = ctx.engine.progress(&user, track).await?;

    if ctx.json {
        return ctx.print_json(&json!({ "credited": credited, "progress": record }));
    }
    println!("Awarded {} XP to {} on {}", amount, user, track);
    print_record_line(record.as_ref());
    Ok(())
}

/// Complete a lesson
pub async fn lesson_command(ctx: &AppContext, user: &str, lesson_id: &str, xp: i64, track: Track) -> Result<()> {
    let user = user_id(user)?;
    let credited = ctx.engine.complete_lesson(&user, lesson_id, xp, track).await?;
    let record = ctx.engine.progress(&user, track).await?;

    if ctx.json {
        return ctx.print_json(&json!({ "credited": credited, "progress": record }));
    }
    if credited {
        println!("Lesson {} completed: +{} XP", lesson_id, xp);
    } else {
        println!("Lesson {} was already completed. No XP awarded.", lesson_id);
    }
    print_record_line(record.as_ref());
    Ok(())
}

/// Answer a daily challenge
pub async fn challenge_command(
    ctx: &AppContext,
    user: &str,
    challenge_id: &str,
    correct: bool,
    xp: i64,
    track: Track,
) -> Result<()> {
    let user = user_id(user)?;
    let credited = ctx
        .engine
        .complete_daily_challenge(&user, challenge_id, correct, xp, track)
        .await?;
    let record = ctx.engine.progress(&user, track).await?;

    if ctx.json {
        return ctx.print_json(&json!({ "credited": credited, "progress": record }));
    }
    if credited {
        // Validation above guarantees xp >= 0
        let earned = daily_challenge_xp(xp.max(0) as u64, correct);
        let verdict = if correct { "correct" } else { "incorrect" };
        println!("Challenge {} answered ({}): +{} XP", challenge_id, verdict, earned);
    } else {
        println!("Challenge {} was already answered. No XP awarded.", challenge_id);
    }
    print_record_line(record.as_ref());
    Ok(())
}

/// Show a user's progress
pub async fn show_command(ctx: &AppContext, user: &str, track: Option<Track>) -> Result<()> {
    let user = user_id(user)?;

    if let Some(track) = track {
        let record = ctx.engine.progress(&user, track).await?;
        if ctx.json {
            return ctx.print_json(&record);
        }
        print_record_line(record.as_ref());
        return Ok(());
    }

    let summary = ctx.engine.summary(&user).await?;
    if ctx.json {
        return ctx.print_json(&summary);
    }

    println!(
        "{}: {} XP, level {} ({}, {:.0}% to next)",
        summary.user_id,
        summary.total_xp,
        summary.level.level,
        summary.level.title,
        summary.level.progress_to_next() * 100.0
    );
    println!(
        "Live streak {} days, best {} days\n",
        summary.live_streak, summary.best_streak
    );
    if summary.tracks.is_empty() {
        println!("No activity yet.");
        return Ok(());
    }
    for record in &summary.tracks {
        print_record_line(Some(record));
    }
    Ok(())
}

/// List pending credits
pub async fn pending_command(ctx: &AppContext, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(ctx.config.reconcile.batch_size);
    let pending = ctx.engine.pending_credits(limit).await?;

    if ctx.json {
        return ctx.print_json(&pending);
    }
    if pending.is_empty() {
        println!("No pending credits.");
        return Ok(());
    }

    println!("Pending credits ({}):\n", pending.len());
    for item in &pending {
        println!(
            "  {} {} {} +{} XP (completed {})",
            item.user_id,
            item.track,
            item.source.key(),
            item.xp,
            item.completed_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Repair pending credits
pub async fn reconcile_command(ctx: &AppContext, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(ctx.config.reconcile.batch_size);
    let report = ctx.engine.reconcile(limit).await?;

    if ctx.json {
        return ctx.print_json(&report);
    }
    println!(
        "Scanned {}, repaired {}, already credited {}, failed {}",
        report.scanned, report.repaired, report.already_credited, report.failed
    );
    Ok(())
}

fn print_record_line(record: Option<&UserProgressRecord>) {
    match record {
        Some(r) => println!(
            "  {:<11} {:>7} XP  streak {} (best {})  last active {}",
            r.track.label(),
            r.xp_points,
            r.streak_days,
            r.longest_streak,
            r.last_activity_at.format("%Y-%m-%d")
        ),
        None => println!("  No activity on this track yet."),
    }
}
