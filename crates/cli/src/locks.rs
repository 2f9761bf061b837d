//! Lock file keeping ticks from overlapping
//!
//! `check`, `run`, `status` and `clear-cache` all hold the lock for as long
//! as they touch the state directory, so a cron-driven `check` can never run
//! on top of a long-lived `run`.
//!
//! The lock is the `flock` itself. The file is never unlinked: the kernel
//! drops the lock when the holder's descriptor closes, including when the
//! holder dies. The JSON inside only describes the holder for messages.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

const LOCK_FILE: &str = "locks/drivewatch.lock";

/// Exclusive lock on a state directory, released when dropped
pub struct TickLock {
    #[allow(dead_code)]
    file: File,
}

/// Lock file content
#[derive(Debug, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

impl TickLock {
    /// Acquire the lock for `state_dir`, failing if anyone else holds it
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        match Self::try_acquire(state_dir)? {
            Some(lock) => Ok(lock),
            None => match Self::holder(state_dir) {
                Some(holder) => anyhow::bail!(
                    "Another drivewatch process (pid {}) has been running since {}",
                    holder.pid,
                    holder.started_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => anyhow::bail!("Another drivewatch process holds the state lock"),
            },
        }
    }

    /// Acquire the lock for `state_dir`, or `None` if it is held elsewhere
    pub fn try_acquire(state_dir: &Path) -> Result<Option<Self>> {
        let lock_path = state_dir.join(LOCK_FILE);

        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .context("Failed to open lock file")?;

        if !try_flock_exclusive(&file)? {
            return Ok(None);
        }

        Self::write_holder(&mut file)?;
        Ok(Some(Self { file }))
    }

    /// Holder recorded in the lock file
    ///
    /// Only meaningful while the lock is busy; a free lock may still carry
    /// the record of its last holder. `None` if the holder has not written
    /// its record yet.
    pub fn holder(state_dir: &Path) -> Option<LockHolder> {
        let mut file = File::open(state_dir.join(LOCK_FILE)).ok()?;
        Self::read_holder(&mut file).ok()
    }

    fn write_holder(file: &mut File) -> Result<()> {
        let holder = LockHolder {
            pid: std::process::id(),
            started_at: Utc::now(),
        };
        let serialized =
            serde_json::to_string(&holder).context("Failed to serialize lock content")?;

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    fn read_holder(file: &mut File) -> Result<LockHolder> {
        file.seek(SeekFrom::Start(0))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        serde_json::from_str(&contents).context("Failed to deserialize lock content")
    }
}

/// Try to take an exclusive flock without blocking
fn try_flock_exclusive(file: &File) -> Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
