//! Change detection pipeline for drivewatch
//!
//! This crate provides:
//! - Folder-set discovery with a short-lived cache
//! - Single-query change detection against a storage backend
//! - The monitor tick: watermark -> folders -> changes -> commit -> notify
//! - A fixed-interval scheduler that never overlaps ticks
//! - Google Drive and local-directory storage backends

pub mod backend;
pub mod detect;
pub mod folders;
pub mod monitor;
pub mod schedule;

pub use backend::{DriveBackend, LocalBackend};
pub use detect::ChangeDetector;
pub use folders::FolderIndex;
pub use monitor::{ChannelStatus, Monitor, MonitorConfig, MonitorStatus, TickError, TickReport};
pub use schedule::{PeriodicChecker, RunStats};
