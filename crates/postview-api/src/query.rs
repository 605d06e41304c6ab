// ── Collection query parameters ──
//
// Typed replacement for the loose `{page, limit, sort, order}` option bag
// the collection endpoints accept. Parameter names follow the json-server
// conventions (`_page`, `_limit`, `_sort`, `_order`, plain field filters).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use url::Url;

use crate::error::Error;

/// Public JSON placeholder service used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Minimum number of posts per page (enough to fill one screen).
pub const MIN_POSTS_COUNT: u32 = 3;

/// Number of users loaded for the author filter.
pub const MAX_USERS_COUNT: u32 = 10;

/// Sort direction for `_order`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Field name for `_sort`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SortField {
    Id,
    UserId,
    Title,
    Body,
}

/// Query for one page of a collection endpoint.
///
/// A zero `page` or `limit` is left out of the URL entirely, so the server
/// falls back to its own defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
    /// Filter on the `userId` field of the collection.
    pub user_id: Option<u64>,
}

impl Default for ResourceQuery {
    fn default() -> Self {
        Self::page(1, MIN_POSTS_COUNT)
    }
}

impl ResourceQuery {
    /// Unsorted, unfiltered page.
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            sort: None,
            order: None,
            user_id: None,
        }
    }

    pub fn sorted(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = Some(field);
        self.order = Some(order);
        self
    }

    pub fn for_user(mut self, user_id: Option<u64>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Query-string pairs in the order they are appended to the URL.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if self.page > 0 {
            pairs.push(("_page", self.page.to_string()));
        }
        if self.limit > 0 {
            pairs.push(("_limit", self.limit.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("_sort", sort.to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("_order", order.to_string()));
        }
        if let Some(user_id) = self.user_id {
            pairs.push(("userId", user_id.to_string()));
        }
        pairs
    }
}

/// Build the locator for `endpoint` (e.g. `/posts`) under `base`.
///
/// The endpoint is appended to whatever path `base` already carries, so a
/// base of `https://host/api` yields `https://host/api/posts?...`.
pub fn resource_url(base: &Url, endpoint: &str, query: &ResourceQuery) -> Result<Url, Error> {
    let endpoint = endpoint.trim_start_matches('/');
    let mut url = Url::parse(&format!(
        "{}/{endpoint}",
        base.as_str().trim_end_matches('/')
    ))?;

    let pairs = query.pairs();
    if !pairs.is_empty() {
        let mut qp = url.query_pairs_mut();
        for (name, value) in &pairs {
            qp.append_pair(name, value);
        }
    }

    Ok(url)
}
