// postview-api: Async Rust client for paginated JSON collection APIs

pub mod client;
pub mod error;
pub mod link;
pub mod query;
pub mod transport;

pub use client::{Page, PageClient};
pub use error::Error;
pub use link::PageLinks;
pub use query::{
    DEFAULT_BASE_URL, MAX_USERS_COUNT, MIN_POSTS_COUNT, ResourceQuery, SortField, SortOrder,
    resource_url,
};
pub use transport::TransportConfig;
