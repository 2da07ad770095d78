//! Batch commit writer.

use thiserror::Error;
use tracing::{error, info};

use crate::api::{CatalogClient, MAX_APPEND_BATCH};
use crate::error::CatalogError;
use crate::models::TrackId;

/// Result of a fully committed track list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitReport {
    /// Append calls made.
    pub chunks: usize,
    /// Tracks appended.
    pub tracks: usize,
}

/// A chunk failed. Earlier chunks stay in the playlist.
#[derive(Debug, Error)]
#[error("Chunk {failed_chunk} failed after {committed_chunks} chunk(s) were committed: {source}")]
pub struct CommitFailure {
    /// Chunks appended before the failure.
    pub committed_chunks: usize,
    /// Tracks appended before the failure.
    pub committed_tracks: usize,
    /// 0-based index of the chunk that failed.
    pub failed_chunk: usize,
    #[source]
    pub source: CatalogError,
}

/// Append `track_ids` to a playlist in order, [`MAX_APPEND_BATCH`] at a time.
///
/// Stops at the first failing chunk. Nothing is rolled back. An empty
/// list makes no calls.
pub async fn commit_tracks<C>(
    client: &C,
    user_id: &str,
    playlist_id: &str,
    track_ids: &[TrackId],
) -> Result<CommitReport, CommitFailure>
where
    C: CatalogClient + ?Sized,
{
    let total_chunks = track_ids.len().div_ceil(MAX_APPEND_BATCH);
    let mut report = CommitReport::default();

    for (index, chunk) in track_ids.chunks(MAX_APPEND_BATCH).enumerate() {
        if let Err(source) = client.append_tracks(user_id, playlist_id, chunk).await {
            error!(
                "Appending chunk {} of {} to playlist {} failed: {}",
                index + 1,
                total_chunks,
                playlist_id,
                source
            );
            return Err(CommitFailure {
                committed_chunks: report.chunks,
                committed_tracks: report.tracks,
                failed_chunk: index,
                source,
            });
        }

        report.chunks += 1;
        report.tracks += chunk.len();
        info!(
            "Committed chunk {} of {} ({} tracks)",
            index + 1,
            total_chunks,
            chunk.len()
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCatalog;
    use std::sync::atomic::Ordering;

    fn ids(count: usize) -> Vec<TrackId> {
        (0..count).map(|i| TrackId::new(format!("t{}", i))).collect()
    }

    #[tokio::test]
    async fn test_chunks_of_one_hundred_in_order() {
        let catalog = FakeCatalog::new();
        let track_ids = ids(250);

        let report = commit_tracks(&catalog, "u", "p", &track_ids).await.unwrap();

        assert_eq!(report, CommitReport { chunks: 3, tracks: 250 });
        assert_eq!(catalog.appended_sizes(), vec![100, 100, 50]);

        let appended: Vec<TrackId> = catalog.appended.lock().unwrap().concat();
        assert_eq!(appended, track_ids);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_empty_tail() {
        let catalog = FakeCatalog::new();
        commit_tracks(&catalog, "u", "p", &ids(200)).await.unwrap();
        assert_eq!(catalog.appended_sizes(), vec![100, 100]);
    }

    #[tokio::test]
    async fn test_empty_list_makes_no_calls() {
        let catalog = FakeCatalog::new();

        let report = commit_tracks(&catalog, "u", "p", &[]).await.unwrap();

        assert_eq!(report, CommitReport::default());
        assert_eq!(catalog.append_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_chunk_failure_stops_commit() {
        let catalog = FakeCatalog::new().failing_append(2);

        let failure = commit_tracks(&catalog, "u", "p", &ids(250))
            .await
            .unwrap_err();

        assert_eq!(failure.committed_chunks, 1);
        assert_eq!(failure.committed_tracks, 100);
        assert_eq!(failure.failed_chunk, 1);
        assert_eq!(catalog.append_calls.load(Ordering::SeqCst), 2);
        assert_eq!(catalog.appended_sizes(), vec![100]);
    }
}
