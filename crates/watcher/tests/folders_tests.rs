//! Folder discovery, caching and single-query detection

mod common;

use common::{at, FakeBackend};
use dw_core::{FolderId, FolderSet, Watermark};
use journal::{FolderCache, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use watcher::{ChangeDetector, FolderIndex};

const TTL: Duration = Duration::from_secs(300);

fn tree() -> Arc<FakeBackend> {
    let backend = Arc::new(FakeBackend::new("root"));
    backend.add_folder("root", "a");
    backend.add_folder("root", "b");
    backend.add_folder("a", "a1");
    backend.add_folder("a1", "a2");
    backend
}

fn index(backend: Arc<FakeBackend>, store: Arc<MemoryStore>) -> FolderIndex {
    FolderIndex::new(backend, FolderCache::new(store, TTL))
}

fn ids(set: &FolderSet) -> Vec<&str> {
    let mut ids: Vec<_> = set.iter().map(|id| id.as_str()).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_walk_collects_every_folder() {
    let backend = tree();
    let index = index(backend.clone(), Arc::new(MemoryStore::new()));

    let set = index.resolve_folder_set(&FolderId::from("root")).await.unwrap();

    assert_eq!(ids(&set), vec!["a", "a1", "a2", "b", "root"]);
    assert_eq!(backend.child_calls(), 5);
}

#[tokio::test]
async fn test_cache_hit_skips_backend() {
    let backend = tree();
    let index = index(backend.clone(), Arc::new(MemoryStore::new()));
    let root = FolderId::from("root");

    let first = index.resolve_folder_set(&root).await.unwrap();
    let (resolves, children) = (backend.resolve_calls(), backend.child_calls());

    let second = index.resolve_folder_set(&root).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.resolve_calls(), resolves);
    assert_eq!(backend.child_calls(), children);
}

#[tokio::test]
async fn test_new_subfolder_appears_after_clear() {
    let backend = tree();
    let index = index(backend.clone(), Arc::new(MemoryStore::new()));
    let root = FolderId::from("root");

    index.resolve_folder_set(&root).await.unwrap();
    backend.add_folder("b", "b1");

    // Still served from cache
    assert_eq!(index.resolve_folder_set(&root).await.unwrap().len(), 5);

    index.clear(&root).unwrap();
    let set = index.resolve_folder_set(&root).await.unwrap();
    assert!(set.contains(&FolderId::from("b1")));
}

#[tokio::test]
async fn test_expired_cache_rewalks() {
    let backend = tree();
    let index = FolderIndex::new(
        backend.clone(),
        FolderCache::new(Arc::new(MemoryStore::new()), Duration::ZERO),
    );
    let root = FolderId::from("root");

    index.resolve_folder_set(&root).await.unwrap();
    index.resolve_folder_set(&root).await.unwrap();

    assert_eq!(backend.resolve_calls(), 2);
}

#[tokio::test]
async fn test_cache_write_failure_is_not_fatal() {
    let backend = tree();
    let store = Arc::new(MemoryStore::new());
    store.fail_cache_writes(true);
    let index = index(backend.clone(), store);
    let root = FolderId::from("root");

    let set = index.resolve_folder_set(&root).await.unwrap();
    assert_eq!(set.len(), 5);

    // Nothing was cached, so the next call walks again
    index.resolve_folder_set(&root).await.unwrap();
    assert_eq!(backend.resolve_calls(), 2);
}

#[tokio::test]
async fn test_corrupt_cache_is_replaced() {
    let backend = tree();
    let store = Arc::new(MemoryStore::new());
    store.insert_raw_cache("cachedFolderIds:root", "not json", TTL);
    let index = index(backend.clone(), store);
    let root = FolderId::from("root");

    let set = index.resolve_folder_set(&root).await.unwrap();
    assert_eq!(set.len(), 5);

    index.resolve_folder_set(&root).await.unwrap();
    assert_eq!(backend.resolve_calls(), 1);
}

#[tokio::test]
async fn test_shared_subfolder_listed_once() {
    let backend = Arc::new(FakeBackend::new("root"));
    backend.add_folder("root", "a");
    backend.add_folder("root", "b");
    backend.add_folder("a", "shared");
    backend.add_folder("b", "shared");
    let index = index(backend.clone(), Arc::new(MemoryStore::new()));

    let set = index.walk(&FolderId::from("root")).await.unwrap();

    assert_eq!(ids(&set), vec!["a", "b", "root", "shared"]);
    assert_eq!(backend.child_calls(), 4);
}

#[tokio::test]
async fn test_deep_tree_walk() {
    let backend = Arc::new(FakeBackend::new("d0"));
    for depth in 1..5_000 {
        backend.add_folder(&format!("d{}", depth - 1), &format!("d{}", depth));
    }
    let index = index(backend.clone(), Arc::new(MemoryStore::new()));

    let set = index.walk(&FolderId::from("d0")).await.unwrap();
    assert_eq!(set.len(), 5_000);
}

#[tokio::test]
async fn test_child_listing_failure_aborts_walk() {
    let backend = tree();
    backend.fail_children(true);
    let store = Arc::new(MemoryStore::new());
    let index = index(backend.clone(), store.clone());
    let root = FolderId::from("root");

    assert!(index.resolve_folder_set(&root).await.is_err());
    assert_eq!(FolderCache::new(store, TTL).get(&root).unwrap(), None);
}

#[tokio::test]
async fn test_detector_issues_one_query() {
    let backend = tree();
    backend.add_file("a2", "deep.txt", "https://x/deep", at("2024-01-01T00:00:00Z"));
    backend.add_file("b", "side.txt", "https://x/side", at("2024-01-02T00:00:00Z"));
    let index = index(backend.clone(), Arc::new(MemoryStore::new()));
    let detector = ChangeDetector::new(backend.clone());

    let folders = index.resolve_folder_set(&FolderId::from("root")).await.unwrap();
    let changes = detector
        .find_changes(&folders, Watermark::epoch())
        .await
        .unwrap();

    assert_eq!(changes.len(), 2);
    assert_eq!(backend.query_calls(), 1);
    assert_eq!(backend.last_query().unwrap().folders.len(), 5);
}

#[tokio::test]
async fn test_detector_skips_empty_folder_set() {
    let backend = tree();
    let detector = ChangeDetector::new(backend.clone());

    let changes = detector
        .find_changes(&FolderSet::new(), Watermark::epoch())
        .await
        .unwrap();

    assert!(changes.is_empty());
    assert_eq!(backend.query_calls(), 0);
}
