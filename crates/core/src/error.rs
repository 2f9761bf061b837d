//! Storage backend errors

use crate::types::FolderId;
use thiserror::Error;

/// A storage backend call failed
///
/// Any of these aborts the current tick; the watermark is left untouched and
/// the next scheduled tick retries.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("folder not found: {0}")]
    NotFound(FolderId),

    #[error("not a folder: {0}")]
    NotAFolder(FolderId),

    #[error("request failed: {0}")]
    Http(String),

    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed backend response: {0}")]
    Decode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
