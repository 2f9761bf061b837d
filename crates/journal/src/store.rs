//! Key-value state storage using sled

use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// State storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state database error: {0}")]
    Sled(#[from] sled::Error),

    #[error("corrupt state entry: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Durable properties plus expiring cache entries
///
/// Properties live until overwritten. Cache entries disappear once their TTL
/// has elapsed and may be dropped at any time.
pub trait StateStore: Send + Sync {
    fn get_property(&self, key: &str) -> Result<Option<String>>;

    fn set_property(&self, key: &str, value: &str) -> Result<()>;

    fn cache_get(&self, key: &str) -> Result<Option<String>>;

    fn cache_put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    fn cache_remove(&self, key: &str) -> Result<()>;
}

/// Cache value plus its absolute expiry
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CacheEntry {
    pub value: String,
    pub expires_at_ms: i64,
}

impl CacheEntry {
    pub fn new(value: &str, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            value: value.to_string(),
            expires_at_ms: now_ms().saturating_add(ttl_ms),
        }
    }

    pub fn is_expired(&self) -> bool {
        now_ms() >= self.expires_at_ms
    }
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// sled-backed state store
///
/// Layout under the state directory:
/// ```text
/// state.db/
///   properties   (key -> UTF-8 value)
///   cache        (key -> JSON CacheEntry)
/// ```
pub struct SledStore {
    /// Sled database
    db: Db,
    /// Durable properties (watermark)
    properties: Tree,
    /// Expiring entries (folder sets)
    cache: Tree,
}

impl SledStore {
    /// Open or create a store in the given directory
    pub fn open(dir: &Path) -> Result<Self> {
        let db = sled::open(dir.join("state.db"))?;
        let properties = db.open_tree("properties")?;
        let cache = db.open_tree("cache")?;

        Ok(Self {
            db,
            properties,
            cache,
        })
    }

    /// Drop every expired cache entry, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        let mut removed = 0;
        for item in self.cache.iter() {
            let (key, value) = item?;
            let expired = match serde_json::from_slice::<CacheEntry>(&value) {
                Ok(entry) => entry.is_expired(),
                Err(e) => {
                    warn!(
                        "Dropping corrupt cache entry {}: {}",
                        String::from_utf8_lossy(&key),
                        e
                    );
                    true
                }
            };
            if expired {
                self.cache.remove(key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl StateStore for SledStore {
    fn get_property(&self, key: &str) -> Result<Option<String>> {
        let value = match self.properties.get(key)? {
            Some(v) => v,
            None => return Ok(None),
        };
        Ok(Some(String::from_utf8_lossy(&value).into_owned()))
    }

    fn set_property(&self, key: &str, value: &str) -> Result<()> {
        self.properties.insert(key, value.as_bytes())?;

        // Flush to ensure durability
        self.db.flush()?;
        Ok(())
    }

    fn cache_get(&self, key: &str) -> Result<Option<String>> {
        let raw = match self.cache.get(key)? {
            Some(v) => v,
            None => return Ok(None),
        };

        let entry: CacheEntry = serde_json::from_slice(&raw)?;
        if entry.is_expired() {
            debug!("Cache entry {} expired", key);
            self.cache.remove(key)?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn cache_put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = serde_json::to_vec(&CacheEntry::new(value, ttl))?;
        self.cache.insert(key, entry)?;
        Ok(())
    }

    fn cache_remove(&self, key: &str) -> Result<()> {
        self.cache.remove(key)?;
        Ok(())
    }
}
