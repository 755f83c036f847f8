//! Achievement commands

use anyhow::Result;

use cyberlearn::AchievementType;

use super::{user_id, AppContext};

/// Issue an achievement
pub async fn achieve_command(
    ctx: &AppContext,
    user: &str,
    kind: AchievementType,
    title: &str,
    description: &str,
    xp: i64,
    badge: usize,
) -> Result<()> {
    let user = user_id(user)?;
    let achievement = ctx
        .engine
        .issue_achievement(&user, kind, title, description, xp, badge)
        .await?;

    if ctx.json {
        return ctx.print_json(&achievement);
    }
    println!(
        "{} {} - {} ({})",
        achievement.badge_icon, achievement.badge_name, achievement.title, achievement.achievement_type
    );
    println!("Share token: {}", achievement.share_token);
    Ok(())
}

/// List a user's achievements
pub async fn list_command(ctx: &AppContext, user: &str) -> Result<()> {
    let user = user_id(user)?;
    let achievements = ctx.engine.list_achievements(&user).await?;

    if ctx.json {
        return ctx.print_json(&achievements);
    }
    if achievements.is_empty() {
        println!("No achievements yet.");
        return Ok(());
    }

    println!("Achievements ({}):\n", achievements.len());
    for a in &achievements {
        println!(
            "  {} {:<20} {} [{}]",
            a.badge_icon,
            a.badge_name,
            a.title,
            a.created_at.format("%Y-%m-%d")
        );
        if !a.description.is_empty() {
            println!("      {}", a.description);
        }
    }
    Ok(())
}
