//! Durable monitor state
//!
//! This crate provides:
//! - A key-value `StateStore` with plain properties and TTL cache entries
//! - `SledStore` (sled embedded DB) and `MemoryStore` implementations
//! - `WatermarkStore`, the single owner of the last-processed timestamp
//! - `FolderCache`, the short-lived folder-set cache

pub mod cache;
pub mod memory;
pub mod store;
pub mod watermark;

// Re-exports
pub use cache::FolderCache;
pub use memory::MemoryStore;
pub use store::{SledStore, StateStore, StoreError};
pub use watermark::WatermarkStore;

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, StoreError>;
