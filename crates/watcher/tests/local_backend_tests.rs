//! Local directory backend against a real temporary tree

use chrono::{DateTime, TimeZone, Utc};
use dw_core::{BackendError, FileQuery, FolderId, FolderSet, StorageBackend, Watermark};
use filetime::{set_file_mtime, FileTime};
use journal::MemoryStore;
use notifier::{NotificationsConfig, RecordingTransport, WebhookChannel};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use watcher::backend::local::ROOT_ID;
use watcher::{LocalBackend, Monitor, MonitorConfig};

fn write_at(path: &Path, when: DateTime<Utc>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"data").unwrap();
    set_file_mtime(path, FileTime::from_unix_time(when.timestamp(), 0)).unwrap();
}

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_at(&dir.path().join("top.txt"), utc(2024, 1, 1));
    write_at(&dir.path().join("docs/old.txt"), utc(2020, 1, 1));
    write_at(&dir.path().join("docs/2024/new.txt"), utc(2024, 6, 1));
    fs::create_dir_all(dir.path().join("empty")).unwrap();
    dir
}

#[tokio::test]
async fn test_resolve_root_and_children() {
    let dir = setup();
    let backend = LocalBackend::new(dir.path());
    let root = FolderId::from(ROOT_ID);

    assert_eq!(backend.resolve_folder(&root).await.unwrap(), root);

    let mut children = backend.child_folders(&root).await.unwrap();
    children.sort();
    assert_eq!(children, vec![FolderId::from("docs"), FolderId::from("empty")]);

    let nested = backend.child_folders(&FolderId::from("docs")).await.unwrap();
    assert_eq!(nested, vec![FolderId::from("docs/2024")]);
}

#[tokio::test]
async fn test_resolve_errors() {
    let dir = setup();
    let backend = LocalBackend::new(dir.path());

    assert!(matches!(
        backend.resolve_folder(&FolderId::from("missing")).await,
        Err(BackendError::NotFound(_))
    ));
    assert!(matches!(
        backend.resolve_folder(&FolderId::from("top.txt")).await,
        Err(BackendError::NotAFolder(_))
    ));
    assert!(matches!(
        backend.resolve_folder(&FolderId::from("../outside")).await,
        Err(BackendError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_query_filters_by_folder_and_time() {
    let dir = setup();
    let backend = LocalBackend::new(dir.path());

    let folders: FolderSet = vec![FolderId::from(ROOT_ID), FolderId::from("docs")].into();
    let query = FileQuery::new(&folders, Watermark::from_datetime(utc(2023, 1, 1)));
    let records = backend.query_files(&query).await.unwrap();

    // docs/2024 is not in the query, docs/old.txt is too old
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["top.txt"]);
    assert!(records[0].url.starts_with("file://"));
    assert_eq!(records[0].last_updated, utc(2024, 1, 1));
}

#[tokio::test]
async fn test_monitor_over_local_tree() {
    let dir = setup();
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::new());

    let mut config = MonitorConfig::new(ROOT_ID);
    config.notifications = NotificationsConfig {
        webhook: WebhookChannel {
            enabled: true,
            url: "https://hooks.test/drivewatch".into(),
        },
        ..Default::default()
    };
    let monitor = Monitor::new(
        config,
        Arc::new(LocalBackend::new(dir.path())),
        store,
        transport.clone(),
    );

    let report = monitor.check_folder_files_updates().await.unwrap();
    assert_eq!(report.folders, 4);
    assert_eq!(report.changes.len(), 3);
    assert_eq!(
        report.committed,
        Some(Watermark::parse("2024-06-01T00:00:01Z").unwrap())
    );

    let sent = transport.requests_to("hooks.test");
    assert_eq!(sent.len(), 1);
    let text = sent[0].body["text"].as_str().unwrap();
    assert!(text.contains("new.txt - file://"));

    // Touching a file moves it past the watermark
    write_at(&dir.path().join("docs/old.txt"), utc(2025, 1, 1));
    let report = monitor.check_folder_files_updates().await.unwrap();
    let names: Vec<_> = report.changes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["old.txt"]);
}

#[tokio::test]
async fn test_query_treats_vanished_subfolder_as_empty() {
    let dir = setup();
    let backend = LocalBackend::new(dir.path());

    let folders: FolderSet = vec![FolderId::from(ROOT_ID), FolderId::from("gone")].into();
    let query = FileQuery::new(&folders, Watermark::from_datetime(utc(2023, 1, 1)));
    let records = backend.query_files(&query).await.unwrap();
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["top.txt"]);

    // The root itself going missing is still an error
    fs::remove_dir_all(dir.path()).unwrap();
    let root_only: FolderSet = vec![FolderId::from(ROOT_ID)].into();
    let query = FileQuery::new(&root_only, Watermark::from_datetime(utc(2023, 1, 1)));
    assert!(matches!(
        backend.query_files(&query).await,
        Err(BackendError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_tick_after_subfolder_deleted_under_cached_set() {
    let dir = setup();
    let monitor = Monitor::new(
        MonitorConfig::new(ROOT_ID),
        Arc::new(LocalBackend::new(dir.path())),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingTransport::new()),
    );

    let report = monitor.check_folder_files_updates().await.unwrap();
    assert_eq!(report.folders, 4);

    // The folder set is still cached with docs/2024 in it
    fs::remove_dir_all(dir.path().join("docs/2024")).unwrap();
    write_at(&dir.path().join("b.txt"), utc(2025, 1, 1));

    let report = monitor.check_folder_files_updates().await.unwrap();
    assert_eq!(report.folders, 4);
    let names: Vec<_> = report.changes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["b.txt"]);
}
