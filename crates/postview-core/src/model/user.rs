use serde::{Deserialize, Serialize};

/// A single entry of the `/users` collection.
///
/// Only the fields the author filter needs are modelled; the nested
/// address and company objects are ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl User {
    /// Label used by the author filter: `"{username} (ID: {id})"`.
    pub fn filter_label(&self) -> String {
        format!("{} (ID: {})", self.username, self.id)
    }
}
