//! CLI command implementations

pub mod achievements;
pub mod init;
pub mod progress;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use cyberlearn::config::Config;
use cyberlearn::{AchievementType, ProgressEngine, SqliteStore, SystemClock, Track, UserId};

/// Everything a command needs: loaded config and an engine on the database
pub struct AppContext {
    pub config: Config,
    pub engine: ProgressEngine,
    pub json: bool,
}

impl AppContext {
    pub fn open(config_path: Option<&Path>, db_override: Option<&Path>, json: bool) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Config::from_file(path)?,
            None => Config::load()?,
        };
        if let Some(db) = db_override {
            config.store.path = Some(db.to_path_buf());
        }

        let db_path = config.database_path();
        let store = SqliteStore::open_with_timeout(&db_path, config.busy_timeout())?;
        tracing::debug!("Using progress db {}", db_path.display());

        let engine = ProgressEngine::with_options(
            Arc::new(store),
            Arc::new(SystemClock),
            config.engine_options(),
        );
        Ok(Self { config, engine, json })
    }

    /// Print `value` as pretty JSON
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", out);
        Ok(())
    }
}

pub fn user_id(raw: &str) -> Result<UserId> {
    UserId::new(raw).context("Invalid --user")
}

pub fn parse_track(s: &str) -> Result<Track, String> {
    Track::from_str(s).ok_or_else(|| {
        let valid: Vec<_> = Track::all().iter().map(|t| t.as_str()).collect();
        format!("unknown track '{}' (expected one of: {})", s, valid.join(", "))
    })
}

pub fn parse_achievement_type(s: &str) -> Result<AchievementType, String> {
    AchievementType::from_str(s).ok_or_else(|| format!("unknown achievement type '{}'", s))
}
