use thiserror::Error;

/// A single delivery attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("endpoint responded with status {status}")]
    Rejected { status: u16 },
}
