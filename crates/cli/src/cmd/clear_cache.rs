//! Drop the cached folder set

use anyhow::{Context, Result};
use cli_lib::locks::TickLock;
use cli_lib::system_config;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = system_config::load(config_path)?;
    let _lock = TickLock::acquire(&config.state.dir)?;
    let monitor = config.build_monitor()?;

    monitor
        .clear_folder_cache()
        .context("Failed to clear folder cache")?;

    println!(
        "{} Cleared cached folders for {}",
        "✓".green(),
        monitor.root().to_string().cyan()
    );
    Ok(())
}
