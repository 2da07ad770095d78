//! Error types for catalog access and playlist transfers.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by a [`CatalogClient`](crate::api::CatalogClient).
///
/// Rate limiting is normally absorbed by the client itself, so
/// [`CatalogError::RateLimited`] only surfaces when a retry cap was
/// configured and exhausted.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Access token missing, invalid or expired.
    #[error("Bad credentials: {0}")]
    BadCredentials(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Too many requests and the retry budget is spent.
    #[error("Rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Any other non-success response from the catalog.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The configured base URL cannot address endpoints.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A response was well-formed but lacked an expected field.
    #[error("No data from API: {0}")]
    NoData(String),

    /// HTTP request failed.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Why a single song could not be matched.
#[derive(Debug, Error)]
pub enum MissReason {
    /// The search succeeded but returned no candidates.
    #[error("No match in catalog")]
    NotFound,

    /// The search itself failed.
    #[error(transparent)]
    Search(CatalogError),

    /// The lookup task died before classifying its song.
    #[error("Lookup task failed: {0}")]
    TaskFailed(String),
}

/// Failures of the lookup pool itself, as opposed to per-song misses.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The aggregator stopped listening before the job could report.
    #[error("Outcome channel closed before song {position} was reported")]
    ChannelClosed { position: usize },

    /// A lookup task panicked or was cancelled.
    #[error("Lookup task for song {position} failed: {message}")]
    TaskFailed { position: usize, message: String },
}

/// Request-fatal failures of a playlist transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// No usable credentials were supplied.
    #[error("Access token missing")]
    Unauthorized,

    /// The target playlist name was empty.
    #[error("Missing playlist name")]
    MissingPlaylistName,

    /// Looking up the current user failed.
    #[error("Error creating playlist")]
    UserLookup(#[source] CatalogError),

    /// Creating the remote playlist failed.
    #[error("Error creating playlist")]
    PlaylistCreation(#[source] CatalogError),

    /// A commit chunk failed after `committed_chunks` chunks were appended.
    #[error(
        "Error adding tracks to playlist, you probably have an incomplete playlist in your account called {playlist_name}"
    )]
    PartialCommit {
        playlist_name: String,
        committed_chunks: usize,
        committed_tracks: usize,
        #[source]
        source: CatalogError,
    },
}

impl TransferError {
    /// Underlying cause as a display string.
    pub fn cause(&self) -> String {
        match self {
            TransferError::Unauthorized => "no access token supplied".to_string(),
            TransferError::MissingPlaylistName => "playlist name must not be empty".to_string(),
            TransferError::UserLookup(e) | TransferError::PlaylistCreation(e) => e.to_string(),
            TransferError::PartialCommit {
                committed_chunks,
                committed_tracks,
                source,
                ..
            } => format!(
                "{} ({} chunk(s), {} track(s) already committed)",
                source, committed_chunks, committed_tracks
            ),
        }
    }

    /// Structured `{message, error}` pair for callers.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            message: self.to_string(),
            error: self.cause(),
        }
    }
}

/// Errors reading an iTunes playlist export.
#[derive(Debug, Error)]
pub enum ItunesError {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The export is neither UTF-8 nor BOM-marked UTF-16.
    #[error("Unsupported text encoding in playlist export")]
    Encoding,
}

/// Caller-facing error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub message: String,
    pub error: String,
}
