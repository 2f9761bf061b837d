//! In-memory state store for tests and dry runs

use crate::store::{CacheEntry, StateStore, StoreError};
use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Non-durable `StateStore`
///
/// With the `test-util` feature, writes can be made to fail on demand, which
/// lets callers exercise their persistence-failure paths.
#[derive(Default)]
pub struct MemoryStore {
    properties: Mutex<HashMap<String, String>>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    fail_property_writes: AtomicBool,
    fail_cache_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set_property` fail (or succeed again)
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_property_writes(&self, fail: bool) {
        self.fail_property_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `cache_put` fail (or succeed again)
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_cache_writes(&self, fail: bool) {
        self.fail_cache_writes.store(fail, Ordering::SeqCst);
    }

    /// Store a raw cache value, bypassing any serialization a caller does
    #[cfg(any(test, feature = "test-util"))]
    pub fn insert_raw_cache(&self, key: &str, value: &str, ttl: Duration) {
        self.cache
            .lock()
            .insert(key.to_string(), CacheEntry::new(value, ttl));
    }
}

impl StateStore for MemoryStore {
    fn get_property(&self, key: &str) -> Result<Option<String>> {
        Ok(self.properties.lock().get(key).cloned())
    }

    fn set_property(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_property_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("write to {key} rejected")));
        }
        self.properties
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn cache_get(&self, key: &str) -> Result<Option<String>> {
        let mut cache = self.cache.lock();
        let expired = match cache.get(key) {
            Some(entry) => entry.is_expired(),
            None => return Ok(None),
        };
        if expired {
            cache.remove(key);
            return Ok(None);
        }
        Ok(cache.get(key).map(|entry| entry.value.clone()))
    }

    fn cache_put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        if self.fail_cache_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("cache write to {key} rejected")));
        }
        self.cache
            .lock()
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    fn cache_remove(&self, key: &str) -> Result<()> {
        self.cache.lock().remove(key);
        Ok(())
    }
}
