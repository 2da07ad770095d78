//! Data models for playlist transfers.
//!
//! [`Song`] is what an exported playlist contains; [`Track`],
//! [`Playlist`] and [`User`] are what the catalog returns.

pub mod playlist;
pub mod song;
pub mod track;

// Re-exports for convenience
pub use playlist::{Playlist, User};
pub use song::Song;
pub use track::{Track, TrackId};
