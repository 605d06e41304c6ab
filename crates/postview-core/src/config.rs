// ── Runtime feed configuration ──
//
// Describes *where* the feed comes from and how pages are shaped. Never
// touches disk: postview-config (or a test) builds a `FeedConfig` and
// hands it to the controllers.

use std::time::Duration;

use postview_api::{
    DEFAULT_BASE_URL, MAX_USERS_COUNT, MIN_POSTS_COUNT, PageClient, ResourceQuery, SortField,
    SortOrder, TransportConfig,
};
use url::Url;

use crate::error::CoreError;

/// Configuration for one feed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// API root, e.g. `https://jsonplaceholder.typicode.com`.
    pub base_url: Url,
    pub posts_endpoint: String,
    pub users_endpoint: String,
    /// Posts per page.
    pub page_size: u32,
    /// Users loaded for the author filter.
    pub users_limit: u32,
    /// Field the order selector sorts on.
    pub sort_field: SortField,
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL"),
            posts_endpoint: "/posts".into(),
            users_endpoint: "/users".into(),
            page_size: MIN_POSTS_COUNT,
            users_limit: MAX_USERS_COUNT,
            sort_field: SortField::Title,
            timeout: Duration::from_secs(30),
        }
    }
}

impl FeedConfig {
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::with_timeout(self.timeout)
    }

    /// Unsorted, unfiltered first page.
    pub fn first_page(&self) -> ResourceQuery {
        ResourceQuery::page(1, self.page_size)
    }

    /// First page for the given order/author selection.
    ///
    /// `_sort` is only sent alongside an explicit order.
    pub fn posts_query(&self, order: Option<SortOrder>, user_id: Option<u64>) -> ResourceQuery {
        let query = self.first_page().for_user(user_id);
        match order {
            Some(order) => query.sorted(self.sort_field, order),
            None => query,
        }
    }

    pub fn users_query(&self) -> ResourceQuery {
        ResourceQuery::page(1, self.users_limit)
    }

    pub fn page_client(&self) -> Result<PageClient, CoreError> {
        Ok(PageClient::new(self.base_url.clone(), &self.transport())?)
    }
}
