//! Configuration inspection command

use anyhow::{Context, Result};
use cli_lib::system_config;
use owo_colors::OwoColorize;
use std::path::Path;

/// Print the effective configuration with credentials masked
pub async fn run_show(config_path: Option<&Path>) -> Result<()> {
    let config = system_config::load_unchecked(config_path)?;
    let location = match config_path {
        Some(path) => path.to_path_buf(),
        None => system_config::config_file_path()
            .context("Could not determine config file path")?,
    };

    println!("{}", "System Configuration".bold());
    println!("{}: {}", "Location".dimmed(), location.display().dimmed());
    if !location.exists() {
        println!("{}", "(file does not exist, showing defaults)".dimmed());
    }
    println!();

    let rendered =
        toml::to_string_pretty(&config.redacted()).context("Failed to render configuration")?;
    println!("{}", rendered);

    match config.validate() {
        Ok(()) => println!("{} Configuration is valid", "✓".green()),
        Err(e) => println!("{} {}", "✗".red(), e),
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  schedule.interval_secs: 10-86400");
    println!("  schedule.tick_timeout_secs: 1 or more");
    println!("  state.folder_cache_ttl_secs: 1-86400");
    println!("  delivery.max_attempts: 1-10");

    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(config_path: Option<&Path>, create: bool) -> Result<()> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => system_config::config_file_path()
            .context("Could not determine config file path")?,
    };

    if create && system_config::init_if_missing(&config_path)? {
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}
