//! Catalog access.
//!
//! [`CatalogClient`] is the seam between the matching pipeline and the
//! remote music service. [`SpotifyApi`] is the production implementation;
//! tests substitute scripted fakes.

pub mod spotify;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Playlist, Track, TrackId, User};

pub use spotify::{RetryPolicy, SpotifyApi, MAX_SEARCH_LIMIT};

/// Largest number of tracks a single playlist append accepts.
pub const MAX_APPEND_BATCH: usize = 100;

/// Operations the transfer needs from a music catalog.
///
/// Implementations retry rate-limited calls themselves, waiting out the
/// server's back-off before resubmitting. Callers see a throttled call
/// as a slow call and never run their own retry loop for it.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Whether credentials are present at all. Checked before any call.
    fn has_credentials(&self) -> bool;

    /// Search tracks. Candidates come back in the catalog's ranking order.
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>>;

    /// The account the credentials belong to.
    async fn current_user(&self) -> Result<User>;

    /// Create a private playlist for `user_id`.
    async fn create_playlist(&self, user_id: &str, name: &str) -> Result<Playlist>;

    /// Append at most [`MAX_APPEND_BATCH`] tracks to a playlist.
    async fn append_tracks(
        &self,
        user_id: &str,
        playlist_id: &str,
        track_ids: &[TrackId],
    ) -> Result<()>;

    /// Back-off recently requested by the server, if any.
    fn backoff_hint(&self) -> Option<Duration> {
        None
    }
}
