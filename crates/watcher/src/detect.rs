//! Change detection

use dw_core::{BackendError, ChangeRecord, FileQuery, FolderSet, StorageBackend, Watermark};
use std::sync::Arc;
use tracing::debug;

/// Finds files modified at or after a watermark
///
/// Issues exactly one backend query per call, however many folders are in
/// the set.
pub struct ChangeDetector {
    backend: Arc<dyn StorageBackend>,
}

impl ChangeDetector {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub async fn find_changes(
        &self,
        folders: &FolderSet,
        since: Watermark,
    ) -> Result<Vec<ChangeRecord>, BackendError> {
        if folders.is_empty() {
            debug!("Empty folder set; skipping query");
            return Ok(Vec::new());
        }

        let query = FileQuery::new(folders, since);
        debug!(
            "Querying {} for files modified since {} in {} folders",
            self.backend.name(),
            since,
            folders.len()
        );
        self.backend.query_files(&query).await
    }
}
