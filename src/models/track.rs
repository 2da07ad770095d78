//! Catalog track models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque catalog track identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Spotify URI form, as required by playlist writes.
    pub fn uri(&self) -> String {
        format!("spotify:track:{}", self.0)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A track returned by a catalog search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Track {
    /// Catalog identifier.
    pub id: TrackId,

    /// Track title.
    pub name: String,

    /// Artist names, primary artist first.
    #[serde(default)]
    pub artists: Vec<String>,

    /// Album title.
    #[serde(default)]
    pub album: String,

    /// Duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

impl Track {
    /// Get the primary artist name.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    /// Get all artist names joined by a separator.
    pub fn artists_string(&self, separator: &str) -> String {
        self.artists.join(separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_uri() {
        assert_eq!(TrackId::new("6rqhFgbbKwnb9MLmUQDhG6").uri(), "spotify:track:6rqhFgbbKwnb9MLmUQDhG6");
    }

    #[test]
    fn test_track_artists_string() {
        let track = Track {
            artists: vec!["Artist One".to_string(), "Artist Two".to_string()],
            ..Default::default()
        };
        assert_eq!(track.artists_string(", "), "Artist One, Artist Two");
        assert_eq!(track.primary_artist(), Some("Artist One"));
    }
}
