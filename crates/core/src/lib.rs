//! Drivewatch Core - domain types shared by every drivewatch crate
//!
//! This crate provides:
//! - Watermark, folder set and change record types
//! - The combined file query handed to storage backends
//! - The `StorageBackend` trait and its error type

pub mod backend;
pub mod error;
pub mod query;
pub mod types;

// Re-export main types for convenience
pub use backend::StorageBackend;
pub use error::BackendError;
pub use query::FileQuery;
pub use types::{ChangeRecord, FolderId, FolderSet, Watermark};
