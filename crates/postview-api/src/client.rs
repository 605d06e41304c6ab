// Collection page HTTP client
//
// Wraps `reqwest::Client` with collection URL construction, `Link` header
// pagination and JSON array decoding. Knows nothing about caching: that
// lives one layer up in `postview-core`.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::link::PageLinks;
use crate::query::{ResourceQuery, resource_url};
use crate::transport::TransportConfig;

/// One decoded page of a collection plus its pagination relations.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub links: PageLinks,
}

impl<T> Page<T> {
    /// Cursor for the following page, `None` on the last one.
    pub fn next(&self) -> Option<&Url> {
        self.links.next()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<Url>) {
        let next = self.links.next().cloned();
        (self.items, next)
    }
}

/// Raw HTTP client for a paginated JSON collection API.
///
/// The base URL's scheme is authoritative: pagination links advertised by
/// the server are rewritten to it before the caller sees them.
pub struct PageClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PageClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Locator for one page of `endpoint` under this client's base URL.
    pub fn url_for(&self, endpoint: &str, query: &ResourceQuery) -> Result<Url, Error> {
        resource_url(&self.base_url, endpoint, query)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// GET an arbitrary page locator (typically a previous page's cursor).
    pub async fn fetch_page<T: DeserializeOwned>(&self, url: &Url) -> Result<Page<T>, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let header = resp
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let links = PageLinks::parse(header.as_deref(), url, self.base_url.scheme());

        let body = resp.text().await?;
        let items: Vec<T> = serde_json::from_str(&body).map_err(|e| {
            debug!(%url, %body, "page body did not decode");
            Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            }
        })?;

        debug!(count = items.len(), has_next = links.next().is_some(), "page decoded");
        Ok(Page { items, links })
    }

    /// Build the locator for `endpoint` + `query` and fetch it.
    pub async fn list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &ResourceQuery,
    ) -> Result<Page<T>, Error> {
        let url = self.url_for(endpoint, query)?;
        self.fetch_page(&url).await
    }
}
