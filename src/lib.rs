//! # Tunebridge
//!
//! Rebuild exported iTunes playlists as Spotify playlists.
//!
//! ## Quick Start
//!
//! The easiest way to use this library is through the [`PlaylistTransfer`] struct:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tunebridge::{itunes, PlaylistTransfer, SpotifyApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = Arc::new(SpotifyApi::new("your_access_token")?);
//!     let songs = itunes::read_playlist(std::fs::File::open("Playlist.txt")?)?;
//!
//!     let mut transfer = PlaylistTransfer::new(api);
//!     transfer.set_workers(4);
//!
//!     let summary = transfer.run("From iTunes", songs).await?;
//!     println!("{} of {} songs matched", summary.total_matched, summary.total_songs);
//!     for miss in &summary.unmatched_details {
//!         println!("  {} - {}: {}", miss.song.artist, miss.song.name, miss.reason);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## How matching works
//!
//! - Every song is searched as `track:{name} artist:{artist}`; the first
//!   candidate is taken as the match, no ranking is applied.
//! - Lookups run on a pool of configurable size (default 1).
//! - Rate-limited requests are retried by [`SpotifyApi`] after the
//!   server's `Retry-After` delay.
//! - Matches are appended in chunks of 100. If a chunk fails the transfer
//!   stops and reports how much was already written.
//!
//! ## Lower-level pieces
//!
//! - [`pipeline`] - dispatch, aggregation, commit and summary stages
//! - [`CatalogClient`] - the catalog seam, implement it to plug in another service
//! - [`itunes`] - export parsing

pub mod api;
pub mod converters;
pub mod cooldown;
pub mod error;
pub mod itunes;
pub mod models;
pub mod pipeline;
mod transfer;

#[cfg(test)]
mod testing;

// Main interface (recommended)
pub use transfer::{PlaylistTransfer, TransferConfig};

// Low-level APIs
pub use api::{CatalogClient, RetryPolicy, SpotifyApi};
pub use cooldown::Cooldown;
pub use error::{CatalogError, ErrorReport, ItunesError, MissReason, PoolError, TransferError};
pub use models::{Playlist, Song, Track, TrackId, User};
pub use pipeline::{MatchOutcome, MatchSummary};
