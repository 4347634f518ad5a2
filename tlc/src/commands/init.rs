// Copyright (c) 2024 Botho Foundation

use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use crate::config::Config;

/// Run the init command
pub fn run(config_path: &Path, force: bool) -> Result<()> {
    if Config::exists(config_path) && !force {
        bail!(
            "Config already exists at {}\nUse --force to overwrite it or pass a different --config path.",
            config_path.display()
        );
    }

    let config = Config::default();
    config.save(config_path)?;

    info!("Config written to {}", config_path.display());
    println!("\nDefault launch configuration created.");
    println!("Config saved to: {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit the price cliffs and scenario to taste");
    println!("  2. Run 'tlc cliffs' to inspect the auction schedule");
    println!("  3. Run 'tlc simulate' to replay the launch");

    Ok(())
}
