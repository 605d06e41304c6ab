// postview-core: Reactive stores, cache-aside page fetching and the feed
// controllers that tie them together. Sits between postview-api and the
// CLI; never reads config files or touches the terminal.

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod model;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheEntry, CacheError, CacheKey, DataCache, MemoryCache, RedbCache};
pub use config::FeedConfig;
pub use controller::{PostsCommand, PostsController, UsersController};
pub use error::CoreError;
pub use fetch::{CachedFetcher, FetchSource, FetchedPage};
pub use model::{Post, User};
pub use state::{State, Unsubscribe};

// Query vocabulary is shared with the API layer.
pub use postview_api::{SortField, SortOrder};
