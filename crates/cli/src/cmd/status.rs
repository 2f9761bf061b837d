//! Show monitor status

use anyhow::Result;
use cli_lib::locks::TickLock;
use cli_lib::system_config::{self, SourceKind};
use notifier::Channel;
use owo_colors::OwoColorize;
use std::path::Path;
use watcher::ChannelStatus;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = system_config::load(config_path)?;

    println!("{}", "Drivewatch Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    let kind = match config.source.kind {
        SourceKind::Drive => "drive",
        SourceKind::Local => "local",
    };
    println!("Source:        {} {}", kind, config.source.root.cyan());
    println!("State:         {}", config.state.dir.display());

    // Hold the lock while reading so no check can open the store meanwhile
    let Some(_lock) = TickLock::try_acquire(&config.state.dir)? else {
        match TickLock::holder(&config.state.dir) {
            Some(holder) => println!(
                "Checker:       {} (pid {}, since {})",
                "Running ✓".green(),
                holder.pid,
                holder.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("Checker:       {}", "Running ✓".green()),
        }
        println!();
        println!(
            "  {}",
            "Watermark and cache are unavailable while the checker runs".dimmed()
        );
        println!();

        let channels: Vec<ChannelStatus> = config
            .notifications
            .channels()
            .iter()
            .map(|c| ChannelStatus {
                name: c.name(),
                enabled: c.is_enabled(),
                configured: c.is_configured(),
            })
            .collect();
        print_channels(&channels);
        return Ok(());
    };

    println!("Checker:       {}", "Not running".yellow());
    println!();

    let monitor = config.build_monitor()?;
    let status = monitor.status()?;

    match status.watermark {
        Some(watermark) => println!("Watermark:     {}", watermark.to_iso_string().yellow()),
        None => println!(
            "Watermark:     {}",
            "none (first check reports every file)".dimmed()
        ),
    }
    match status.cached_folders {
        Some(count) => println!("Folder cache:  {} folders", count),
        None => println!("Folder cache:  {}", "empty".dimmed()),
    }
    println!();

    print_channels(&status.channels);
    Ok(())
}

fn print_channels(channels: &[ChannelStatus]) {
    println!("Channels:");
    for channel in channels {
        let state = match (channel.enabled, channel.configured) {
            (true, true) => "ready ✓".green().to_string(),
            (true, false) => "enabled, not configured".yellow().to_string(),
            (false, _) => "disabled".dimmed().to_string(),
        };
        println!("  {:<10} {}", channel.name, state);
    }

    if !channels.iter().any(|c| c.enabled && c.configured) {
        println!();
        println!(
            "{}",
            "Tip: Enable a channel under [notifications] to receive messages".dimmed()
        );
    }
}
