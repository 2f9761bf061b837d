//! Storage backend seam
//!
//! The monitor only needs three capabilities from a hierarchical file store;
//! everything provider-specific lives behind this trait.

use crate::error::BackendError;
use crate::query::FileQuery;
use crate::types::{ChangeRecord, FolderId};
use async_trait::async_trait;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Confirm `id` exists and is a folder, returning its canonical id
    async fn resolve_folder(&self, id: &FolderId) -> Result<FolderId, BackendError>;

    /// Direct child folders of `id` (not recursive)
    async fn child_folders(&self, id: &FolderId) -> Result<Vec<FolderId>, BackendError>;

    /// Every file matching `query`
    async fn query_files(&self, query: &FileQuery) -> Result<Vec<ChangeRecord>, BackendError>;
}
