//! Playlist and account models.

use serde::{Deserialize, Serialize};

/// A playlist owned by the current user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Playlist {
    /// Catalog playlist ID.
    pub id: String,

    /// Playlist title.
    pub name: String,

    /// Whether the playlist is publicly visible.
    #[serde(default)]
    pub public: bool,
}

/// The account the access token belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Catalog user ID.
    pub id: String,

    /// Display name, if the account has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}
