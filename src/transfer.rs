//! Playlist transfer orchestration.
//!
//! Ties the pipeline stages together for one request: validate, match
//! every song, cool down, create the playlist, commit the matches and
//! summarize.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::api::CatalogClient;
use crate::cooldown::Cooldown;
use crate::error::TransferError;
use crate::models::Song;
use crate::pipeline::{aggregate, commit_tracks, dispatch, MatchResults, MatchSummary};

/// Tunables of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Concurrent catalog lookups. Values below one count as one.
    pub workers: usize,
    /// Pause between matching and playlist creation.
    pub cooldown: Cooldown,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            cooldown: Cooldown::default(),
        }
    }
}

/// Rebuilds an exported playlist in a remote catalog.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tunebridge::{PlaylistTransfer, Song, SpotifyApi};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = Arc::new(SpotifyApi::new("access-token")?);
///     let mut transfer = PlaylistTransfer::new(api);
///     transfer.set_workers(4);
///
///     let songs = vec![Song::new("Yesterday", "The Beatles", "Help!")];
///     let summary = transfer.run("Imported", songs).await?;
///     println!("{} of {} matched", summary.total_matched, summary.total_songs);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct PlaylistTransfer<C: ?Sized> {
    client: Arc<C>,
    config: TransferConfig,
}

impl<C> PlaylistTransfer<C>
where
    C: CatalogClient + ?Sized + 'static,
{
    /// Create a transfer with the default configuration.
    pub fn new(client: Arc<C>) -> Self {
        Self::with_config(client, TransferConfig::default())
    }

    pub fn with_config(client: Arc<C>, config: TransferConfig) -> Self {
        Self { client, config }
    }

    /// Set the number of concurrent lookups.
    pub fn set_workers(&mut self, workers: usize) {
        self.config.workers = workers.max(1);
    }

    /// Get the number of concurrent lookups.
    pub fn workers(&self) -> usize {
        self.config.workers.max(1)
    }

    /// Set the post-matching cooldown policy.
    pub fn set_cooldown(&mut self, cooldown: Cooldown) {
        self.config.cooldown = cooldown;
    }

    /// Get the post-matching cooldown policy.
    pub fn cooldown(&self) -> Cooldown {
        self.config.cooldown
    }

    /// Match every song without writing anything.
    pub async fn match_songs(&self, songs: Vec<Song>) -> MatchResults {
        let total = songs.len();
        let started = Instant::now();
        info!("Starting matching on {} songs", total);

        let results = aggregate(dispatch(Arc::clone(&self.client), songs, self.workers())).await;

        info!(
            "Matching completed in {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        info!("{} of {} songs matched", results.matched.len(), total);

        results
    }

    /// Match `songs` and write the matches to a new private playlist.
    ///
    /// Credentials and the playlist name are checked before any catalog
    /// call. Songs without a match are reported in the summary, not as
    /// errors.
    ///
    /// # Errors
    ///
    /// - [`TransferError::Unauthorized`] / [`TransferError::MissingPlaylistName`]
    ///   when the request is rejected up front.
    /// - [`TransferError::UserLookup`] / [`TransferError::PlaylistCreation`]
    ///   when no playlist could be created.
    /// - [`TransferError::PartialCommit`] when an append failed. The
    ///   playlist exists and may hold some of the matched tracks.
    pub async fn run(
        &self,
        playlist_name: &str,
        songs: Vec<Song>,
    ) -> Result<MatchSummary, TransferError> {
        if !self.client.has_credentials() {
            return Err(TransferError::Unauthorized);
        }
        if playlist_name.trim().is_empty() {
            return Err(TransferError::MissingPlaylistName);
        }

        let results = self.match_songs(songs).await;

        self.config.cooldown.wait(self.client.as_ref()).await;

        let user = self
            .client
            .current_user()
            .await
            .map_err(TransferError::UserLookup)?;
        let playlist = self
            .client
            .create_playlist(&user.id, playlist_name)
            .await
            .map_err(TransferError::PlaylistCreation)?;
        info!("Created playlist {} ({})", playlist.name, playlist.id);

        let report = commit_tracks(
            self.client.as_ref(),
            &user.id,
            &playlist.id,
            &results.track_ids(),
        )
        .await
        .map_err(|failure| {
            warn!(
                "Playlist {} is incomplete: {} tracks committed before the failure",
                playlist_name, failure.committed_tracks
            );
            TransferError::PartialCommit {
                playlist_name: playlist_name.to_string(),
                committed_chunks: failure.committed_chunks,
                committed_tracks: failure.committed_tracks,
                source: failure.source,
            }
        })?;

        let mut summary = MatchSummary::compose(playlist_name, results);
        summary.playlist_id = Some(playlist.id);
        summary.tracks_added = report.tracks;

        Ok(summary)
    }
}
