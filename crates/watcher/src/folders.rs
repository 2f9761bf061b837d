//! Folder-set discovery
//!
//! Walks the tree under a root with an explicit stack, so arbitrarily deep
//! trees cannot exhaust the call stack. Results are cached for a short TTL;
//! cache trouble is never fatal.

use dw_core::{BackendError, FolderId, FolderSet, StorageBackend};
use journal::{FolderCache, StoreError};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct FolderIndex {
    backend: Arc<dyn StorageBackend>,
    cache: FolderCache,
}

impl FolderIndex {
    pub fn new(backend: Arc<dyn StorageBackend>, cache: FolderCache) -> Self {
        Self { backend, cache }
    }

    /// Every folder under `root`, root included
    ///
    /// Served from the cache while a non-empty entry is live; otherwise the
    /// tree is walked and the result cached.
    pub async fn resolve_folder_set(&self, root: &FolderId) -> Result<FolderSet, BackendError> {
        match self.cache.get(root) {
            Ok(Some(set)) => {
                debug!("Using {} cached folder ids for {}", set.len(), root);
                return Ok(set);
            }
            Ok(None) => debug!("No cached folder ids for {}; walking tree", root),
            Err(e) => warn!("Ignoring unreadable folder cache for {}: {}", root, e),
        }

        let set = self.walk(root).await?;
        info!("Discovered {} folders under {}", set.len(), root);

        if let Err(e) = self.cache.put(root, &set) {
            warn!("Failed to cache folder ids for {}: {}", root, e);
        }

        Ok(set)
    }

    /// Walk the tree under `root` without consulting the cache
    pub async fn walk(&self, root: &FolderId) -> Result<FolderSet, BackendError> {
        let root = self.backend.resolve_folder(root).await?;

        let mut set = FolderSet::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            // A folder reachable through two parents is only expanded once
            if !set.insert(id.clone()) {
                continue;
            }
            for child in self.backend.child_folders(&id).await? {
                if !set.contains(&child) {
                    stack.push(child);
                }
            }
        }

        Ok(set)
    }

    /// Forget the cached set so the next resolve walks again
    pub fn clear(&self, root: &FolderId) -> Result<(), StoreError> {
        self.cache.clear(root)?;
        info!("Cleared cached folder ids for {}", root);
        Ok(())
    }

    /// Size of the live cached set, if any
    pub fn cached_len(&self, root: &FolderId) -> Option<usize> {
        self.cache.get(root).ok().flatten().map(|set| set.len())
    }
}
