//! Songs read from an exported playlist.

use serde::{Deserialize, Serialize};

/// One row of an exported playlist.
///
/// Songs carry no identity of their own: two rows with identical fields
/// are still two songs, told apart by their position in the export.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Song {
    /// Song title.
    pub name: String,

    /// Performing artist.
    pub artist: String,

    /// Album title.
    #[serde(default)]
    pub album: String,
}

impl Song {
    /// Create a new song.
    pub fn new<S1, S2, S3>(name: S1, artist: S2, album: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            name: name.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }

    /// Catalog search query for this song.
    pub fn search_query(&self) -> String {
        format!("track:{} artist:{}", self.name, self.artist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_format() {
        let song = Song::new("Hey Jude", "The Beatles", "1");
        assert_eq!(song.search_query(), "track:Hey Jude artist:The Beatles");
    }

    #[test]
    fn test_album_defaults_when_missing() {
        let song: Song = serde_json::from_str(r#"{"name":"a","artist":"b"}"#).unwrap();
        assert_eq!(song.album, "");
    }
}
