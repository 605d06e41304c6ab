// ── Cache-aside page fetching ──
//
// Every page request goes through `CachedFetcher::fetch_page`: probe the
// cache, fall back to the network on a miss, write the network page back.
// Failures never escape as `Err`; they come back as an empty `Failed` page
// so the stores can keep rendering.

use std::sync::Arc;

use postview_api::PageClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use url::Url;

use crate::cache::{CacheKey, DataCache};
use crate::error::CoreError;

/// Where a page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Network,
    Cache,
    /// Network or decode failure; `items` is empty.
    Failed,
}

/// Outcome of one `fetch_page` call.
#[derive(Debug, Clone)]
pub struct FetchedPage<T> {
    pub items: Vec<T>,
    /// Cursor for the following page as advertised (or stored) for this one.
    pub next: Option<Url>,
    pub source: FetchSource,
    /// Human-readable reason when `source` is `Failed`.
    pub error: Option<String>,
}

impl<T> FetchedPage<T> {
    fn failed(reason: String) -> Self {
        Self {
            items: Vec::new(),
            next: None,
            source: FetchSource::Failed,
            error: Some(reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.source == FetchSource::Failed
    }
}

/// Shape of a cached page: the decoded items and their `next` cursor.
#[derive(Debug, Deserialize)]
struct CachedPage<T> {
    items: Vec<T>,
    next: Option<Url>,
}

#[derive(Serialize)]
struct CachedPageRef<'a, T> {
    items: &'a [T],
    next: Option<&'a Url>,
}

/// Page client plus the cache it reads through.
pub struct CachedFetcher {
    client: PageClient,
    cache: Arc<dyn DataCache>,
}

impl CachedFetcher {
    /// The cache must already be initialised.
    pub fn new(client: PageClient, cache: Arc<dyn DataCache>) -> Result<Self, CoreError> {
        if !cache.is_ready() {
            return Err(CoreError::CacheNotReady);
        }
        Ok(Self { client, cache })
    }

    pub fn client(&self) -> &PageClient {
        &self.client
    }

    pub fn cache(&self) -> &Arc<dyn DataCache> {
        &self.cache
    }

    /// Fetch one page of `T`, preferring a cached copy.
    pub async fn fetch_page<T>(&self, url: &Url) -> FetchedPage<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let key = CacheKey::from_url(url);

        if let Some(page) = self.read_cached::<T>(&key).await {
            debug!(key = %key, count = page.items.len(), "page cache hit");
            return FetchedPage {
                items: page.items,
                next: page.next,
                source: FetchSource::Cache,
                error: None,
            };
        }
        debug!(key = %key, "page cache miss");

        let page = match self.client.fetch_page::<T>(url).await {
            Ok(page) => page,
            Err(e) => {
                error!(url = %url, error = %e, "page fetch failed");
                return FetchedPage::failed(e.to_string());
            }
        };
        let (items, next) = page.into_parts();

        self.write_cached(&key, &items, next.as_ref()).await;

        FetchedPage {
            items,
            next,
            source: FetchSource::Network,
            error: None,
        }
    }

    async fn read_cached<T>(&self, key: &CacheKey) -> Option<CachedPage<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.cache.has(key).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "page cache probe failed");
                return None;
            }
        }

        // Separate round trip: the entry may be gone by now.
        let entry = match self.cache.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(key = %key, "page cache entry vanished between probe and read");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "page cache read failed");
                return None;
            }
        };

        match serde_json::from_value::<CachedPage<T>>(entry.value) {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding undecodable page cache entry");
                None
            }
        }
    }

    async fn write_cached<T>(&self, key: &CacheKey, items: &[T], next: Option<&Url>)
    where
        T: Serialize + Sync,
    {
        let value = match serde_json::to_value(CachedPageRef { items, next }) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "page not cacheable");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, value).await {
            warn!(key = %key, error = %e, "page cache write failed");
        }
    }
}
