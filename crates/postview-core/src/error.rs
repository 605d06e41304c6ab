// ── Core error types ──
//
// Errors surfaced by postview-core. Consumers never match on reqwest or
// redb failures directly: `From<postview_api::Error>` folds transport
// failures into feed-level variants, and cache failures are wrapped whole.

use thiserror::Error;

use crate::cache::CacheError;

/// Everything the feed controllers and fetcher can fail with.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    /// The server answered, but not with a usable page.
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Page cache used before init() completed")]
    CacheNotReady,

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Controller is not running")]
    ControllerStopped,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<postview_api::Error> for CoreError {
    fn from(err: postview_api::Error) -> Self {
        use postview_api::Error as ApiError;

        let status = err.status();
        match err {
            ApiError::Transport(e) if e.is_timeout() => Self::Timeout,
            ApiError::Transport(e) if e.is_connect() => Self::ConnectionFailed {
                url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            ApiError::Transport(e) => Self::Api {
                message: e.to_string(),
                status,
            },
            ApiError::InvalidUrl(e) => Self::Config {
                message: format!("bad feed URL: {e}"),
            },
            ApiError::Status { status, url } => Self::Api {
                message: format!("{url} answered HTTP {status}"),
                status: Some(status),
            },
            // The raw body is only useful at debug level, which the client
            // already logged.
            ApiError::Deserialization { message, .. } => {
                Self::Internal(format!("unexpected page payload: {message}"))
            }
        }
    }
}
