//! Init and Config commands.

use anyhow::{Result, anyhow};
use std::path::Path;

use crate::config::Settings;

/// Run init command - create configuration file under `dir`.
pub fn run_init(dir: &Path, force: bool) -> Result<()> {
    let path = Settings::init_config_file(dir, force).map_err(|e| anyhow!("{e}"))?;
    println!("Created configuration file at: {}", path.display());
    println!("Edit this file to customize your settings.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
