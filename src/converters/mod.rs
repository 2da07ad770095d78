//! JSON to model converters.
//!
//! Turns raw Spotify Web API responses into typed model structures.
//! Missing optional fields fall back to empty values; missing IDs are
//! reported as [`CatalogError::NoData`].

use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::models::{Playlist, Track, TrackId, User};

/// Get string from JSON, returning empty string if not found.
fn get_str(json: &Value, key: &str) -> String {
    json.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Get a required non-empty string ID.
fn get_id(json: &Value, key: &str, what: &str) -> Result<String> {
    json.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| CatalogError::NoData(format!("{} without {}", what, key)))
}

/// Parse a single track object.
pub fn parse_track(json: &Value) -> Result<Track> {
    let artists = json
        .get("artists")
        .and_then(|a| a.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|a| a.get("name").and_then(|n| n.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    let album = json
        .get("album")
        .map(|a| get_str(a, "name"))
        .unwrap_or_default();

    Ok(Track {
        id: TrackId::new(get_id(json, "id", "track")?),
        name: get_str(json, "name"),
        artists,
        album,
        duration_ms: json.get("duration_ms").and_then(|v| v.as_u64()).unwrap_or(0),
    })
}

/// Parse a `/search?type=track` response into its candidate tracks.
///
/// Candidates keep the catalog's ranking order. Items that cannot be
/// parsed (unavailable tracks come back as `null`) are skipped.
pub fn parse_search_tracks(json: &Value) -> Result<Vec<Track>> {
    let Some(tracks) = json.get("tracks") else {
        return Err(CatalogError::NoData("search response without tracks".to_string()));
    };

    Ok(tracks
        .get("items")
        .and_then(|i| i.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|t| parse_track(t).ok())
                .collect()
        })
        .unwrap_or_default())
}

/// Parse a `/me` response.
pub fn parse_user(json: &Value) -> Result<User> {
    Ok(User {
        id: get_id(json, "id", "user")?,
        display_name: json
            .get("display_name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
    })
}

/// Parse a playlist object.
pub fn parse_playlist(json: &Value) -> Result<Playlist> {
    Ok(Playlist {
        id: get_id(json, "id", "playlist")?,
        name: get_str(json, "name"),
        public: json.get("public").and_then(|v| v.as_bool()).unwrap_or(false),
    })
}

/// Extract a human-readable message from a Spotify error body.
///
/// Regular API errors look like `{"error": {"status": 401, "message": "..."}}`.
pub fn parse_error_message(json: &Value) -> Option<String> {
    let error = json.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(|s| s.to_string())
}
