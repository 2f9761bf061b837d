//! Periodic checks in the foreground

use anyhow::{Context, Result};
use cli_lib::locks::TickLock;
use cli_lib::system_config;
use owo_colors::OwoColorize;
use std::path::Path;
use tracing::warn;
use watcher::PeriodicChecker;

pub async fn run(config_path: Option<&Path>, interval_secs: Option<u64>) -> Result<()> {
    let mut config = system_config::load(config_path)?;
    if let Some(secs) = interval_secs {
        config.schedule.interval_secs = secs;
        config.validate().context("Invalid --interval-secs")?;
    }

    let _lock = TickLock::acquire(&config.state.dir)?;
    let monitor = config.build_monitor()?;

    println!(
        "Watching {} every {}s {}",
        config.source.root.cyan(),
        config.schedule.interval_secs,
        "(Ctrl-C to stop)".dimmed()
    );

    let checker = PeriodicChecker::new(monitor, config.interval(), config.tick_timeout());
    let stats = checker.run(shutdown_signal()).await;

    println!(
        "{} {} checks, {} failed, {} changes reported",
        "Stopped:".bold(),
        stats.ticks,
        stats.failed,
        stats.changes
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler the loop runs until killed
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
