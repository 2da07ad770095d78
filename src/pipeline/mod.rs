//! The matching pipeline.
//!
//! Songs flow through four stages:
//!
//! 1. [`dispatch`] runs one catalog lookup per song on a bounded pool and
//!    streams classified outcomes.
//! 2. [`aggregate`] is the single consumer of those streams and blocks
//!    until the pool reports completion.
//! 3. [`commit`] appends the matched tracks to the remote playlist in
//!    chunks of [`MAX_APPEND_BATCH`](crate::api::MAX_APPEND_BATCH).
//! 4. [`summary`] derives totals and the success rate.
//!
//! Every song produces exactly one [`MatchOutcome`], so the matched and
//! unmatched collections always partition the input.

pub mod aggregate;
pub mod commit;
pub mod dispatch;
pub mod summary;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::MissReason;
use crate::models::{Song, TrackId};

pub use aggregate::{aggregate, MatchResults};
pub use commit::{commit_tracks, CommitFailure, CommitReport};
pub use dispatch::{dispatch, OutcomeStreams, PoolReport};
pub use summary::{success_rate, MatchSummary};

/// A song the catalog matched. Only the first candidate is ever used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedTrack {
    /// Position of the song in the export.
    pub position: usize,
    /// First candidate returned for the song.
    pub track_id: TrackId,
}

/// A song that could not be matched, with the cause.
#[derive(Debug)]
pub struct UnmatchedSong {
    /// Position of the song in the export.
    pub position: usize,
    pub song: Song,
    pub reason: MissReason,
}

impl Serialize for UnmatchedSong {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("UnmatchedSong", 2)?;
        state.serialize_field("song", &self.song)?;
        state.serialize_field("error", &self.reason.to_string())?;
        state.end()
    }
}

/// Classified result of looking up one song.
#[derive(Debug)]
pub enum MatchOutcome {
    Matched(MatchedTrack),
    Unmatched(UnmatchedSong),
}

impl MatchOutcome {
    pub fn position(&self) -> usize {
        match self {
            MatchOutcome::Matched(m) => m.position,
            MatchOutcome::Unmatched(u) => u.position,
        }
    }
}
