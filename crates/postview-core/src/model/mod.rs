// ── Domain model ──
//
// Canonical types for the two collections the feed works with.

mod post;
mod user;

pub use post::Post;
pub use user::User;
