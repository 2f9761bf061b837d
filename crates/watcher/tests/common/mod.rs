//! Shared fakes for watcher integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dw_core::{BackendError, ChangeRecord, FileQuery, FolderId, StorageBackend};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn at(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
}

#[derive(Debug, Clone)]
struct FakeFile {
    parent: FolderId,
    name: String,
    url: String,
    modified: DateTime<Utc>,
    trashed: bool,
}

/// In-memory folder tree that counts every call
pub struct FakeBackend {
    root: FolderId,
    children: Mutex<HashMap<FolderId, Vec<FolderId>>>,
    files: Mutex<Vec<FakeFile>>,
    fail_queries: AtomicBool,
    fail_children: AtomicBool,
    query_delay: Mutex<Option<Duration>>,
    resolve_calls: AtomicUsize,
    child_calls: AtomicUsize,
    query_calls: AtomicUsize,
    last_query: Mutex<Option<FileQuery>>,
}

impl FakeBackend {
    pub fn new(root: &str) -> Self {
        let root = FolderId::from(root);
        let mut children = HashMap::new();
        children.insert(root.clone(), Vec::new());

        Self {
            root,
            children: Mutex::new(children),
            files: Mutex::new(Vec::new()),
            fail_queries: AtomicBool::new(false),
            fail_children: AtomicBool::new(false),
            query_delay: Mutex::new(None),
            resolve_calls: AtomicUsize::new(0),
            child_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &FolderId {
        &self.root
    }

    pub fn add_folder(&self, parent: &str, child: &str) {
        let mut children = self.children.lock();
        children
            .entry(FolderId::from(parent))
            .or_default()
            .push(FolderId::from(child));
        children.entry(FolderId::from(child)).or_default();
    }

    pub fn add_file(&self, parent: &str, name: &str, url: &str, modified: DateTime<Utc>) {
        self.files.lock().push(FakeFile {
            parent: FolderId::from(parent),
            name: name.to_string(),
            url: url.to_string(),
            modified,
            trashed: false,
        });
    }

    pub fn add_trashed_file(&self, parent: &str, name: &str, modified: DateTime<Utc>) {
        self.files.lock().push(FakeFile {
            parent: FolderId::from(parent),
            name: name.to_string(),
            url: format!("https://x/{name}"),
            modified,
            trashed: true,
        });
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_children(&self, fail: bool) {
        self.fail_children.store(fail, Ordering::SeqCst);
    }

    pub fn delay_queries(&self, delay: Duration) {
        *self.query_delay.lock() = Some(delay);
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn child_calls(&self) -> usize {
        self.child_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<FileQuery> {
        self.last_query.lock().clone()
    }
}

#[async_trait]
impl StorageBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn resolve_folder(&self, id: &FolderId) -> Result<FolderId, BackendError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.children.lock().contains_key(id) {
            Ok(id.clone())
        } else {
            Err(BackendError::NotFound(id.clone()))
        }
    }

    async fn child_folders(&self, id: &FolderId) -> Result<Vec<FolderId>, BackendError> {
        self.child_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_children.load(Ordering::SeqCst) {
            return Err(BackendError::Http("listing unavailable".into()));
        }
        Ok(self.children.lock().get(id).cloned().unwrap_or_default())
    }

    async fn query_files(&self, query: &FileQuery) -> Result<Vec<ChangeRecord>, BackendError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock() = Some(query.clone());

        let delay = *self.query_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 503,
                body: "backend down".into(),
            });
        }

        Ok(self
            .files
            .lock()
            .iter()
            .filter(|f| query.matches(&f.parent, f.modified, f.trashed))
            .map(|f| ChangeRecord::new(f.name.clone(), f.url.clone(), f.modified))
            .collect())
    }
}
