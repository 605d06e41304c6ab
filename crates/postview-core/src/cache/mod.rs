// ── Persistent key-value page cache ──
//
// One entry per canonical request key, last write wins, no expiry.
// Backends implement `DataCache`; the fetch layer only ever talks to the
// trait object it was handed.

mod memory;
mod persistent;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use memory::MemoryCache;
pub use persistent::RedbCache;

/// Name of the single object store / table holding cached pages.
pub const CACHE_NAME: &str = "dataCache";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache used before init()")]
    NotInitialized,

    #[error("cache storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("cache entry encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("cache worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Key ─────────────────────────────────────────────────────────────

/// Canonical identity of a request: path plus query string.
///
/// Scheme and host are deliberately left out, so the same page requested
/// over `http` and `https`, or from a mirror host, shares one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_url(url: &Url) -> Self {
        let mut key = url.path().to_owned();
        if let Some(query) = url.query() {
            key.push('?');
            key.push_str(query);
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Url> for CacheKey {
    fn from(url: &Url) -> Self {
        Self::from_url(url)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Entry ───────────────────────────────────────────────────────────

/// A stored payload and when it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
        }
    }
}

// ── Trait ───────────────────────────────────────────────────────────

/// Async key-value store for fetched pages.
///
/// `init()` must complete before any other call; callers check
/// [`is_ready`](Self::is_ready) instead of relying on implicit global setup.
/// Every method is its own round trip, so `has` followed by `get` can
/// observe a concurrent write in between.
#[async_trait]
pub trait DataCache: Send + Sync {
    /// Open or create the backing store. Idempotent.
    async fn init(&self) -> Result<(), CacheError>;

    fn is_ready(&self) -> bool;

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    async fn set(&self, key: &CacheKey, value: serde_json::Value) -> Result<(), CacheError>;

    async fn has(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Drop every entry.
    async fn clear(&self) -> Result<(), CacheError>;

    async fn entry_count(&self) -> Result<usize, CacheError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_is_path_and_query() {
        let url = Url::parse("https://host/posts?_page=1&_limit=3").unwrap();
        assert_eq!(CacheKey::from_url(&url).as_str(), "/posts?_page=1&_limit=3");
    }

    #[test]
    fn key_without_query_is_just_the_path() {
        let url = Url::parse("https://host/users").unwrap();
        assert_eq!(CacheKey::from(&url).to_string(), "/users");
    }

    #[test]
    fn key_ignores_host_and_scheme() {
        let a = Url::parse("https://host/posts?_page=1").unwrap();
        let b = Url::parse("https://otherhost/posts?_page=1").unwrap();
        let c = Url::parse("http://host:8080/posts?_page=1").unwrap();
        assert_eq!(CacheKey::from_url(&a), CacheKey::from_url(&b));
        assert_eq!(CacheKey::from_url(&a), CacheKey::from_url(&c));
    }

    #[test]
    fn key_distinguishes_queries() {
        let a = Url::parse("https://host/posts?_page=1").unwrap();
        let b = Url::parse("https://host/posts?_page=2").unwrap();
        assert!(CacheKey::from_url(&a) != CacheKey::from_url(&b));
    }
}
