// In-process cache backend: session-only, nothing survives the process.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CacheEntry, CacheError, CacheKey, DataCache};

/// `DashMap`-backed cache for tests and `--no-cache` runs.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ready: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_ready(&self) -> Result<(), CacheError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(CacheError::NotInitialized)
        }
    }
}

#[async_trait]
impl DataCache for MemoryCache {
    async fn init(&self) -> Result<(), CacheError> {
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        self.ensure_ready()?;
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn set(&self, key: &CacheKey, value: serde_json::Value) -> Result<(), CacheError> {
        self.ensure_ready()?;
        self.entries.insert(key.clone(), CacheEntry::new(value));
        Ok(())
    }

    async fn has(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.ensure_ready()?;
        Ok(self.entries.contains_key(key))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.ensure_ready()?;
        self.entries.clear();
        Ok(())
    }

    async fn entry_count(&self) -> Result<usize, CacheError> {
        self.ensure_ready()?;
        Ok(self.entries.len())
    }
}
