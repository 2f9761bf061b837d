//! Local directory tree as a storage backend
//!
//! Folder ids are `/`-separated paths relative to the configured root, with
//! the root itself being `.`. Files carry their filesystem mtime and a
//! `file://` URL. Nothing is ever trashed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dw_core::{BackendError, ChangeRecord, FileQuery, FolderId, StorageBackend};
use reqwest::Url;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Id of the configured root directory
pub const ROOT_ID: &str = ".";

pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a folder id to a directory under the root
    ///
    /// Ids that would escape the root resolve to nothing.
    fn path_of(&self, id: &FolderId) -> Option<PathBuf> {
        let relative = Path::new(id.as_str());
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => path.push(part),
                _ => return None,
            }
        }
        Some(path)
    }

    fn child_id(parent: &FolderId, name: &str) -> FolderId {
        if parent.as_str() == ROOT_ID {
            FolderId::new(name)
        } else {
            FolderId::new(format!("{}/{}", parent, name))
        }
    }

    fn file_url(path: &Path) -> String {
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Url::from_file_path(&absolute)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("file://{}", absolute.display()))
    }

    async fn read_dir(&self, id: &FolderId) -> Result<tokio::fs::ReadDir, BackendError> {
        let dir = self
            .path_of(id)
            .ok_or_else(|| BackendError::NotFound(id.clone()))?;
        tokio::fs::read_dir(&dir).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => BackendError::NotFound(id.clone()),
            _ => BackendError::Io(e),
        })
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn resolve_folder(&self, id: &FolderId) -> Result<FolderId, BackendError> {
        let dir = self
            .path_of(id)
            .ok_or_else(|| BackendError::NotFound(id.clone()))?;
        let metadata = tokio::fs::metadata(&dir).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => BackendError::NotFound(id.clone()),
            _ => BackendError::Io(e),
        })?;

        if !metadata.is_dir() {
            return Err(BackendError::NotAFolder(id.clone()));
        }
        Ok(id.clone())
    }

    async fn child_folders(&self, id: &FolderId) -> Result<Vec<FolderId>, BackendError> {
        let mut entries = self.read_dir(id).await?;
        let mut children = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            // Symlinked directories are not followed
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                children.push(Self::child_id(id, name));
            }
        }

        Ok(children)
    }

    async fn query_files(&self, query: &FileQuery) -> Result<Vec<ChangeRecord>, BackendError> {
        let mut records = Vec::new();

        for folder in &query.folders {
            // A cached folder set can outlive a deleted subfolder
            let mut entries = match self.read_dir(folder).await {
                Ok(entries) => entries,
                Err(BackendError::NotFound(_)) if folder.as_str() != ROOT_ID => {
                    debug!(folder = %folder, "Folder no longer exists, treating as empty");
                    continue;
                }
                Err(e) => return Err(e),
            };
            while let Some(entry) = entries.next_entry().await? {
                if !entry.file_type().await?.is_file() {
                    continue;
                }
                let metadata = match entry.metadata().await {
                    Ok(metadata) => metadata,
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(e.into()),
                };
                let modified: DateTime<Utc> = metadata.modified()?.into();
                if !query.matches(folder, modified, false) {
                    continue;
                }
                records.push(ChangeRecord::new(
                    entry.file_name().to_string_lossy(),
                    Self::file_url(&entry.path()),
                    modified,
                ));
            }
        }

        records.sort_by(|a, b| {
            a.last_updated
                .cmp(&b.last_updated)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(records)
    }
}
