//! Configuration file I/O operations

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fs2::FileExt;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.cyberlearn/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cyberlearn")
    }

    /// Get the global config file path (~/.cyberlearn/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load the global configuration, or defaults if there is none
    pub fn load() -> Result<Self> {
        let path = Self::global_config_path();
        if path.exists() {
            Self::from_file(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Write the configuration next to `path` and rename it into place.
    ///
    /// The staging file is locked while written, so a second writer fails
    /// instead of mixing its content into ours.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let staging = path.with_extension("toml.tmp");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&staging)
            .with_context(|| format!("Failed to open {}", staging.display()))?;
        if file.try_lock_exclusive().is_err() {
            bail!("Another process is writing {}", path.display());
        }

        file.set_len(0)?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        std::fs::rename(&staging, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.store.path = Some(dir.path().join("progress.db"));
        config.achievements.streak_milestones = vec![2, 10];
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.store.path, config.store.path);
        assert_eq!(loaded.achievements.streak_milestones, vec![2, 10]);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_save_refuses_concurrent_writer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let held = std::fs::File::create(path.with_extension("toml.tmp")).unwrap();
        held.lock_exclusive().unwrap();
        let err = Config::default().save_to_file(&path).unwrap_err();
        assert!(err.to_string().contains("Another process"));
        assert!(!path.exists());

        drop(held);
        Config::default().save_to_file(&path).unwrap();
        assert!(Config::from_file(&path).is_ok());
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store\npath = 1").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
