//! drivewatch CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cmd;

/// drivewatch - Notify chat channels about new files in a folder tree
#[derive(Parser)]
#[command(name = "drivewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config_dir>/drivewatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single check and exit
    Check,
    /// Check periodically until interrupted
    Run {
        /// Seconds between checks (overrides schedule.interval_secs)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Also write logs to a daily-rolling file in this directory
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Show watermark, folder cache and channel readiness
    Status,
    /// Forget the cached folder set so the next check walks the tree
    ClearCache,
    /// Inspect configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,

        /// Create the config file if it doesn't exist (with --path)
        #[arg(long)]
        create: bool,

        /// Print an example config file
        #[arg(long)]
        example: bool,

        /// Print the effective configuration with secrets masked
        #[arg(long)]
        show: bool,
    },
}

fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "drivewatch.log"));
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
            None
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = match &cli.command {
        Commands::Run { log_dir, .. } => log_dir.as_deref(),
        _ => None,
    };
    // Dropping the guard flushes the file writer
    let _guard = init_tracing(log_dir);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Check => cmd::check::run(config_path).await,
        Commands::Run { interval_secs, .. } => cmd::run::run(config_path, interval_secs).await,
        Commands::Status => cmd::status::run(config_path).await,
        Commands::ClearCache => cmd::clear_cache::run(config_path).await,
        Commands::Config {
            path,
            create,
            example,
            show,
        } => {
            if example {
                cmd::config::run_example().await
            } else if show {
                cmd::config::run_show(config_path).await
            } else if path || create {
                cmd::config::run_path(config_path, create).await
            } else {
                cmd::config::run_show(config_path).await
            }
        }
    }
}
