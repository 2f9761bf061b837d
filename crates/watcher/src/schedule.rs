//! Fixed-interval tick scheduler
//!
//! Fires a monitor tick every interval (default: 5 minutes). A tick always
//! runs to completion before the next one can start; a tick that overruns
//! its slot delays the following one instead of stacking up behind it.

use crate::monitor::Monitor;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default time between ticks
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default ceiling for a single tick
pub const DEFAULT_TICK_TIMEOUT: Duration = Duration::from_secs(4 * 60);

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub failed: u64,
    pub changes: u64,
}

pub struct PeriodicChecker {
    monitor: Monitor,

    /// Time between tick starts
    interval: Duration,

    /// Ceiling for a single tick
    tick_timeout: Duration,
}

impl PeriodicChecker {
    pub fn new(monitor: Monitor, interval: Duration, tick_timeout: Duration) -> Self {
        Self {
            monitor,
            interval,
            tick_timeout,
        }
    }

    /// Tick until `shutdown` resolves
    ///
    /// The first tick fires immediately. Shutdown is only observed between
    /// ticks, so an in-flight tick always finishes. Failed ticks are logged
    /// and retried at the next interval.
    pub async fn run<F>(self, shutdown: F) -> RunStats
    where
        F: Future<Output = ()>,
    {
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut stats = RunStats::default();

        info!(
            "Starting periodic checks of {} (interval: {:?})",
            self.monitor.root(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping periodic checks after {} ticks", stats.ticks);
                    break;
                }
                _ = timer.tick() => {}
            }

            stats.ticks += 1;
            match self.monitor.check_with_timeout(self.tick_timeout).await {
                Ok(report) if report.changes.is_empty() => {
                    debug!("Periodic check: no changes");
                }
                Ok(report) => {
                    stats.changes += report.changes.len() as u64;
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!("Periodic check failed, retrying next interval: {}", e);
                }
            }
        }

        stats
    }
}
