//! Last-processed timestamp

use crate::store::{StateStore, StoreError};
use crate::Result;
use dw_core::Watermark;
use std::sync::Arc;

/// Property key holding the watermark
pub const LAST_CHECK_TIME_KEY: &str = "lastCheckTime";

/// Sole reader and writer of the watermark property
#[derive(Clone)]
pub struct WatermarkStore {
    store: Arc<dyn StateStore>,
}

impl WatermarkStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Stored watermark, or `None` if no tick has ever committed one
    pub fn get(&self) -> Result<Option<Watermark>> {
        let raw = match self.store.get_property(LAST_CHECK_TIME_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        Watermark::parse(&raw)
            .map(Some)
            .map_err(|source| StoreError::Timestamp { value: raw, source })
    }

    /// Stored watermark, defaulting to the epoch
    pub fn get_or_epoch(&self) -> Result<Watermark> {
        Ok(self.get()?.unwrap_or_else(Watermark::epoch))
    }

    /// Durably record a new watermark
    pub fn set(&self, watermark: Watermark) -> Result<()> {
        self.store
            .set_property(LAST_CHECK_TIME_KEY, &watermark.to_iso_string())
    }
}
