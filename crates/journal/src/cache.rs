//! Folder-set cache
//!
//! Walking a large tree is expensive, so the resolved folder set is kept for a
//! short TTL. New subfolders surface once the entry expires or is cleared.

use crate::store::StateStore;
use crate::Result;
use dw_core::{FolderId, FolderSet};
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of a cached folder set
pub const DEFAULT_FOLDER_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

const CACHE_KEY_PREFIX: &str = "cachedFolderIds";

#[derive(Clone)]
pub struct FolderCache {
    store: Arc<dyn StateStore>,
    ttl: Duration,
}

impl FolderCache {
    pub fn new(store: Arc<dyn StateStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Cached set for `root`
    ///
    /// An empty cached set counts as a miss. A corrupt entry is an error.
    pub fn get(&self, root: &FolderId) -> Result<Option<FolderSet>> {
        let raw = match self.store.cache_get(&cache_key(root))? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let set: FolderSet = serde_json::from_str(&raw)?;
        if set.is_empty() {
            return Ok(None);
        }
        Ok(Some(set))
    }

    /// Cache `set` for `root`; empty sets are never stored
    pub fn put(&self, root: &FolderId, set: &FolderSet) -> Result<()> {
        if set.is_empty() {
            return Ok(());
        }
        let raw = serde_json::to_string(set)?;
        self.store.cache_put(&cache_key(root), &raw, self.ttl)
    }

    /// Forget the cached set for `root`
    pub fn clear(&self, root: &FolderId) -> Result<()> {
        self.store.cache_remove(&cache_key(root))
    }
}

fn cache_key(root: &FolderId) -> String {
    format!("{CACHE_KEY_PREFIX}:{root}")
}
