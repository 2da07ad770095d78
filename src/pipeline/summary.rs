//! Summary composer.

use serde::Serialize;

use super::aggregate::MatchResults;
use super::UnmatchedSong;

/// Final report of a transfer.
///
/// Serializes with the response field names clients rely on
/// (`total`, `unmatched_lines`, `match_success_rate`, ...).
#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub playlist_name: String,

    /// ID of the created playlist, once one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,

    #[serde(rename = "unmatched_lines")]
    pub unmatched_details: Vec<UnmatchedSong>,

    pub total_unmatched: usize,

    pub total_matched: usize,

    #[serde(rename = "total")]
    pub total_songs: usize,

    /// Matched share of all songs, in `0.0..=1.0`.
    #[serde(rename = "match_success_rate")]
    pub success_rate: f64,

    /// Tracks appended to the remote playlist.
    pub tracks_added: usize,
}

impl MatchSummary {
    /// Build the summary of an aggregated run. No playlist is attached yet.
    pub fn compose(playlist_name: impl Into<String>, results: MatchResults) -> Self {
        let total_matched = results.matched.len();
        let total_unmatched = results.unmatched.len();

        Self {
            playlist_name: playlist_name.into(),
            playlist_id: None,
            unmatched_details: results.unmatched,
            total_unmatched,
            total_matched,
            total_songs: results.total,
            success_rate: success_rate(total_matched, results.total),
            tracks_added: 0,
        }
    }
}

/// `matched / total`, or 0 for an empty playlist.
pub fn success_rate(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    matched as f64 / total as f64
}
