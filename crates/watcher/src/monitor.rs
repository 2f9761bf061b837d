//! One detect-and-notify cycle ("tick")
//!
//! Ordering within a tick:
//! 1. Read the watermark
//! 2. Resolve the folder set
//! 3. Query changes since the watermark
//! 4. Commit the advanced watermark
//! 5. Notify every ready channel
//!
//! Steps 1-4 abort the tick on failure with nothing sent. A notification is
//! only ever sent for a window whose watermark advance is already durable.
//! Ticks must not overlap; callers serialize them.

use crate::detect::ChangeDetector;
use crate::folders::FolderIndex;
use dw_core::{BackendError, ChangeRecord, FolderId, StorageBackend, Watermark};
use journal::{FolderCache, StateStore, StoreError, WatermarkStore};
use notifier::{
    Channel, DispatchReport, Dispatcher, NotificationsConfig, RetryPolicy, RetryingSender,
    Transport,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};
use ulid::Ulid;

/// Why a tick ended early
#[derive(Debug, Error)]
pub enum TickError {
    /// Folder resolution or change query failed; watermark untouched
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),

    /// Watermark could not be read or committed; nothing was sent
    #[error("watermark persistence failed: {0}")]
    PersistenceFailure(#[from] StoreError),

    #[error("tick exceeded {0:?}")]
    TimedOut(Duration),
}

/// Everything a monitor needs to know, fixed at construction
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Root of the monitored tree
    pub root: FolderId,
    /// Lifetime of the cached folder set
    pub folder_cache_ttl: Duration,
    pub retry: RetryPolicy,
    pub notifications: NotificationsConfig,
}

impl MonitorConfig {
    pub fn new(root: impl Into<FolderId>) -> Self {
        Self {
            root: root.into(),
            folder_cache_ttl: journal::cache::DEFAULT_FOLDER_CACHE_TTL,
            retry: RetryPolicy::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

/// Outcome of a completed tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub id: Ulid,
    /// Watermark the tick started from
    pub previous: Watermark,
    /// Folders covered by the query
    pub folders: usize,
    pub changes: Vec<ChangeRecord>,
    /// New watermark, if any changes were found
    pub committed: Option<Watermark>,
    pub dispatch: DispatchReport,
}

/// Readiness of one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStatus {
    pub name: &'static str,
    pub enabled: bool,
    pub configured: bool,
}

/// Snapshot of monitor state for display
#[derive(Debug, Clone)]
pub struct MonitorStatus {
    pub root: FolderId,
    pub watermark: Option<Watermark>,
    pub cached_folders: Option<usize>,
    pub channels: Vec<ChannelStatus>,
}

pub struct Monitor {
    root: FolderId,
    folders: FolderIndex,
    detector: ChangeDetector,
    watermarks: WatermarkStore,
    dispatcher: Dispatcher,
    channels: Vec<Box<dyn Channel>>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        backend: Arc<dyn StorageBackend>,
        store: Arc<dyn StateStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let cache = FolderCache::new(store.clone(), config.folder_cache_ttl);

        Self {
            root: config.root,
            folders: FolderIndex::new(backend.clone(), cache),
            detector: ChangeDetector::new(backend),
            watermarks: WatermarkStore::new(store),
            dispatcher: Dispatcher::new(RetryingSender::new(transport, config.retry)),
            channels: config.notifications.channels(),
        }
    }

    pub fn root(&self) -> &FolderId {
        &self.root
    }

    /// Run one tick
    ///
    /// Every log line of the tick carries its id.
    pub async fn check_folder_files_updates(&self) -> Result<TickReport, TickError> {
        let id = Ulid::new();
        let result = self.tick(id).instrument(info_span!("tick", %id)).await;

        if let Err(e) = &result {
            error!(tick = %id, "Check aborted: {}", e);
        }
        result
    }

    /// Run one tick, giving up after `limit`
    ///
    /// A tick cut short after its watermark commit loses the notifications
    /// for that window.
    pub async fn check_with_timeout(&self, limit: Duration) -> Result<TickReport, TickError> {
        match tokio::time::timeout(limit, self.check_folder_files_updates()).await {
            Ok(result) => result,
            Err(_) => {
                error!("Check exceeded {:?}; abandoned", limit);
                Err(TickError::TimedOut(limit))
            }
        }
    }

    async fn tick(&self, id: Ulid) -> Result<TickReport, TickError> {
        info!("=== Starting check ===");

        let previous = self.watermarks.get_or_epoch()?;
        info!("Previous watermark: {}", previous);

        let folders = self.folders.resolve_folder_set(&self.root).await?;
        let changes = self.detector.find_changes(&folders, previous).await?;
        info!("Found {} updated files across {} folders", changes.len(), folders.len());

        let mut report = TickReport {
            id,
            previous,
            folders: folders.len(),
            changes,
            committed: None,
            dispatch: DispatchReport::default(),
        };

        let next = match previous.advance_past(&report.changes) {
            Some(next) => next,
            None => {
                info!("No updated files; no notifications sent");
                return Ok(report);
            }
        };

        self.watermarks.set(next)?;
        report.committed = Some(next);
        info!("Watermark advanced to {}", next);

        report.dispatch = self
            .dispatcher
            .dispatch(&report.changes, &self.channels)
            .await;

        info!(
            "=== Check complete: {} delivered, {} failed ===",
            report.dispatch.delivered(),
            report.dispatch.failed()
        );
        Ok(report)
    }

    /// Drop the cached folder set for the monitored root
    pub fn clear_folder_cache(&self) -> Result<(), StoreError> {
        self.folders.clear(&self.root)
    }

    pub fn status(&self) -> Result<MonitorStatus, StoreError> {
        Ok(MonitorStatus {
            root: self.root.clone(),
            watermark: self.watermarks.get()?,
            cached_folders: self.folders.cached_len(&self.root),
            channels: self
                .channels
                .iter()
                .map(|c| ChannelStatus {
                    name: c.name(),
                    enabled: c.is_enabled(),
                    configured: c.is_configured(),
                })
                .collect(),
        })
    }
}
