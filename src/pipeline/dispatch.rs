//! Search dispatcher.
//!
//! Wraps every song in a lookup job and runs the jobs on a pool of at
//! most `workers` concurrent tasks. Each job reports exactly one outcome,
//! on either the matched or the unmatched stream. When every job has
//! finished the pool drops its senders and fires `done` once.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{MatchOutcome, MatchedTrack, UnmatchedSong};
use crate::api::CatalogClient;
use crate::error::{MissReason, PoolError};
use crate::models::Song;

/// Receiving ends of a running dispatch.
#[derive(Debug)]
pub struct OutcomeStreams {
    /// Number of songs dispatched.
    pub total: usize,
    pub matched: mpsc::Receiver<MatchedTrack>,
    pub unmatched: mpsc::Receiver<UnmatchedSong>,
    /// Errors of the pool machinery. Per-song failures never land here
    /// without also being reported on `unmatched`.
    pub pool_errors: mpsc::UnboundedReceiver<PoolError>,
    /// Fires once, after every job's outcome has been sent.
    pub done: oneshot::Receiver<PoolReport>,
}

/// Completion report of the lookup pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReport {
    /// Jobs run to completion, panicked ones included.
    pub completed: usize,
}

/// One song's lookup.
#[derive(Debug)]
struct SearchJob {
    position: usize,
    total: usize,
    song: Song,
}

impl SearchJob {
    /// Search the catalog and classify the song.
    ///
    /// Only the first candidate counts. Errors are never retried here;
    /// the client already waits out rate limits.
    async fn classify<C>(self, client: &C) -> MatchOutcome
    where
        C: CatalogClient + ?Sized,
    {
        debug!("Searching for song {} of {}", self.position + 1, self.total);

        let reason = match client.search_tracks(&self.song.search_query()).await {
            Ok(tracks) => match tracks.into_iter().next() {
                Some(track) => {
                    return MatchOutcome::Matched(MatchedTrack {
                        position: self.position,
                        track_id: track.id,
                    })
                }
                None => MissReason::NotFound,
            },
            Err(e) => MissReason::Search(e),
        };

        MatchOutcome::Unmatched(UnmatchedSong {
            position: self.position,
            song: self.song,
            reason,
        })
    }

    async fn run<C>(
        self,
        client: Arc<C>,
        matched: mpsc::Sender<MatchedTrack>,
        unmatched: mpsc::Sender<UnmatchedSong>,
    ) -> Result<(), PoolError>
    where
        C: CatalogClient + ?Sized,
    {
        let position = self.position;

        let sent = match self.classify(client.as_ref()).await {
            MatchOutcome::Matched(track) => matched.send(track).await.is_ok(),
            MatchOutcome::Unmatched(miss) => {
                warn!(
                    "No match for \"{}\" by {}: {}",
                    miss.song.name, miss.song.artist, miss.reason
                );
                unmatched.send(miss).await.is_ok()
            }
        };

        if sent {
            Ok(())
        } else {
            Err(PoolError::ChannelClosed { position })
        }
    }
}

/// Start matching `songs` with at most `workers` lookups in flight.
///
/// Returns immediately; the pool runs on the tokio runtime and the caller
/// drains the returned streams, normally with
/// [`aggregate`](super::aggregate::aggregate). `workers` below one is
/// treated as one.
pub fn dispatch<C>(client: Arc<C>, songs: Vec<Song>, workers: usize) -> OutcomeStreams
where
    C: CatalogClient + ?Sized + 'static,
{
    let workers = workers.max(1);
    let total = songs.len();

    let (matched_tx, matched_rx) = mpsc::channel(workers);
    let (unmatched_tx, unmatched_rx) = mpsc::channel(workers);
    let (errors_tx, errors_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let jobs = songs
            .into_iter()
            .enumerate()
            .map(|(position, song)| SearchJob {
                position,
                total,
                song,
            });

        // Jobs are spawned lazily, so no more than `workers` exist at once.
        let mut completed = 0usize;
        let mut finished = stream::iter(jobs)
            .map(|job| {
                let position = job.position;
                let song = job.song.clone();
                let handle = tokio::spawn(job.run(
                    Arc::clone(&client),
                    matched_tx.clone(),
                    unmatched_tx.clone(),
                ));
                async move { (position, song, handle.await) }
            })
            .buffer_unordered(workers);

        while let Some((position, song, result)) = finished.next().await {
            completed += 1;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    let _ = errors_tx.send(e);
                }
                Err(join_error) => {
                    // The job died before reporting, so its song is
                    // reported from here to keep one outcome per song.
                    let message = join_error.to_string();
                    let miss = UnmatchedSong {
                        position,
                        song,
                        reason: MissReason::TaskFailed(message.clone()),
                    };
                    if unmatched_tx.send(miss).await.is_err() {
                        let _ = errors_tx.send(PoolError::ChannelClosed { position });
                    }
                    let _ = errors_tx.send(PoolError::TaskFailed { position, message });
                }
            }
        }
        drop(finished);

        drop(matched_tx);
        drop(unmatched_tx);
        let _ = done_tx.send(PoolReport { completed });
    });

    OutcomeStreams {
        total,
        matched: matched_rx,
        unmatched: unmatched_rx,
        pool_errors: errors_rx,
        done: done_rx,
    }
}
