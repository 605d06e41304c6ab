use serde::{Deserialize, Serialize};

/// A single entry of the `/posts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Post {
    /// Heading shown in lists: `"{id}: {title}"`.
    pub fn heading(&self) -> String {
        format!("{}: {}", self.id, self.title)
    }
}
