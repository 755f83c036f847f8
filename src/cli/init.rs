//! Init command implementation

use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use cyberlearn::config::Config;

/// Write a default configuration file
pub fn init_command(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path);

    if path.exists() && !force {
        bail!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    let config = Config::default();
    config.save_to_file(&path)?;
    info!("Wrote config to {}", path.display());

    println!("Created {}", path.display());
    println!("Progress database: {}", config.database_path().display());
    Ok(())
}
