use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cyberlearn::{AchievementType, Track};

mod cli;

use cli::{parse_achievement_type, parse_track, AppContext};

#[derive(Parser)]
#[command(name = "cyberlearn")]
#[command(about = "Progress, streaks and achievements for cyberlearn learners")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.cyberlearn/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the progress database (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default ~/.cyberlearn/config.toml
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Credit XP outside a lesson or challenge
    Award {
        #[arg(long)]
        user: String,
        #[arg(long, value_parser = parse_track)]
        track: Track,
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
    },

    /// Complete a lesson (credited once per user)
    Lesson {
        lesson_id: String,
        #[arg(long)]
        user: String,
        #[arg(long, allow_negative_numbers = true)]
        xp: i64,
        #[arg(long, value_parser = parse_track, default_value = "learning")]
        track: Track,
    },

    /// Answer a daily challenge (credited once per user)
    Challenge {
        challenge_id: String,
        #[arg(long)]
        user: String,
        /// The answer was correct (otherwise a third of the XP is credited)
        #[arg(long)]
        correct: bool,
        #[arg(long, allow_negative_numbers = true)]
        xp: i64,
        #[arg(long, value_parser = parse_track, default_value = "learning")]
        track: Track,
    },

    /// Issue an achievement
    Achieve {
        #[arg(long)]
        user: String,
        #[arg(long = "type", value_parser = parse_achievement_type)]
        kind: AchievementType,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        xp: i64,
        /// Badge tier (clamped to the highest tier)
        #[arg(long, default_value_t = 0)]
        badge: usize,
    },

    /// List a user's achievements, newest first
    Achievements {
        #[arg(long)]
        user: String,
    },

    /// Show XP, streaks and level for a user
    Show {
        #[arg(long)]
        user: String,
        /// Only show this track
        #[arg(long, value_parser = parse_track)]
        track: Option<Track>,
    },

    /// List completions whose XP has not been credited yet
    Pending {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Credit completions left uncredited by interrupted requests
    Reconcile {
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    let open = || AppContext::open(config_path, cli.db.as_deref(), cli.json);

    match cli.command {
        Commands::Init { force } => {
            cli::init::init_command(config_path, force)?;
        }
        Commands::Award { user, track, amount } => {
            cli::progress::award_command(&open()?, &user, track, amount).await?;
        }
        Commands::Lesson { lesson_id, user, xp, track } => {
            cli::progress::lesson_command(&open()?, &user, &lesson_id, xp, track).await?;
        }
        Commands::Challenge { challenge_id, user, correct, xp, track } => {
            cli::progress::challenge_command(&open()?, &user, &challenge_id, correct, xp, track).await?;
        }
        Commands::Achieve { user, kind, title, description, xp, badge } => {
            cli::achievements::achieve_command(&open()?, &user, kind, &title, &description, xp, badge).await?;
        }
        Commands::Achievements { user } => {
            cli::achievements::list_command(&open()?, &user).await?;
        }
        Commands::Show { user, track } => {
            cli::progress::show_command(&open()?, &user, track).await?;
        }
        Commands::Pending { limit } => {
            cli::progress::pending_command(&open()?, limit).await?;
        }
        Commands::Reconcile { limit } => {
            cli::progress::reconcile_command(&open()?, limit).await?;
        }
    }

    Ok(())
}
