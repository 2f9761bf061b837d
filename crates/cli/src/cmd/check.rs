//! Run a single check

use anyhow::{Context, Result};
use cli_lib::locks::TickLock;
use cli_lib::system_config;
use notifier::{ChannelResult, DeliveryOutcome};
use owo_colors::OwoColorize;
use std::path::Path;
use watcher::TickReport;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = system_config::load(config_path)?;
    let _lock = TickLock::acquire(&config.state.dir)?;
    let monitor = config.build_monitor()?;

    let report = monitor
        .check_with_timeout(config.tick_timeout())
        .await
        .context("Check failed")?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &TickReport) {
    println!(
        "Checked {} folders for changes since {}",
        report.folders,
        report.previous.to_iso_string().dimmed()
    );

    if report.changes.is_empty() {
        println!("{}", "No new or updated files".dimmed());
        return;
    }

    println!();
    for change in &report.changes {
        println!(
            "  {} {}",
            change.name.cyan(),
            change.last_updated.format("%Y-%m-%d %H:%M:%S UTC").dimmed()
        );
        println!("    {}", change.url.dimmed());
    }
    println!();

    if let Some(watermark) = report.committed {
        println!("Watermark:  {}", watermark.to_iso_string().yellow());
    }

    if report.dispatch.attempted() == 0 {
        println!("{}", "No notification channel is ready".yellow());
    }
    for channel in &report.dispatch.channels {
        match &channel.result {
            ChannelResult::Disabled => {}
            ChannelResult::NotConfigured => {
                println!("  {:<10} {}", channel.channel, "not configured".yellow());
            }
            ChannelResult::Sent(DeliveryOutcome::Delivered { attempts }) => {
                if *attempts > 1 {
                    println!(
                        "  {:<10} {} {}",
                        channel.channel,
                        "✓ delivered".green(),
                        format!("(after {} attempts)", attempts).dimmed()
                    );
                } else {
                    println!("  {:<10} {}", channel.channel, "✓ delivered".green());
                }
            }
            ChannelResult::Sent(DeliveryOutcome::Exhausted {
                attempts,
                last_error,
            }) => {
                println!(
                    "  {:<10} {} after {} attempts: {}",
                    channel.channel,
                    "✗ failed".red(),
                    attempts,
                    last_error
                );
            }
        }
    }
}
