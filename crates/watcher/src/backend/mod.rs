//! Storage backend implementations

pub mod drive;
pub mod local;

pub use drive::DriveBackend;
pub use local::LocalBackend;
