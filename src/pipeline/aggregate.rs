//! Result aggregator.
//!
//! The single consumer of a dispatch's outcome streams.

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::dispatch::OutcomeStreams;
use super::{MatchedTrack, UnmatchedSong};
use crate::models::TrackId;

/// Everything a dispatch produced, in arrival order.
#[derive(Debug, Default)]
pub struct MatchResults {
    /// Number of songs dispatched.
    pub total: usize,
    pub matched: Vec<MatchedTrack>,
    pub unmatched: Vec<UnmatchedSong>,
}

impl MatchResults {
    /// Matched track IDs in arrival order.
    pub fn track_ids(&self) -> Vec<TrackId> {
        self.matched.iter().map(|m| m.track_id.clone()).collect()
    }

    /// Whether every dispatched song has exactly one outcome.
    pub fn is_complete(&self) -> bool {
        self.matched.len() + self.unmatched.len() == self.total
    }
}

/// Collect outcomes until the pool reports completion.
///
/// All four streams are polled on every iteration so producers never
/// stall on a full buffer. Outcomes sent just before `done` fired may
/// still sit in the buffers when it does; those are drained before
/// returning.
pub async fn aggregate(streams: OutcomeStreams) -> MatchResults {
    let OutcomeStreams {
        total,
        mut matched,
        mut unmatched,
        mut pool_errors,
        mut done,
    } = streams;

    let mut results = MatchResults {
        total,
        ..Default::default()
    };

    let report = loop {
        tokio::select! {
            biased;

            Some(track) = matched.recv() => results.matched.push(track),
            Some(miss) = unmatched.recv() => results.unmatched.push(miss),
            // Every pool error is either a song already reported as
            // unmatched or a closed channel, so pool errors are logged and
            // dropped rather than counted twice.
            Some(e) = pool_errors.recv() => debug!("Ignoring pool error: {}", e),
            report = &mut done => break report.ok(),
        }
    };

    drain(&mut matched, &mut results.matched).await;
    drain(&mut unmatched, &mut results.unmatched).await;
    while let Some(e) = pool_errors.recv().await {
        debug!("Ignoring pool error: {}", e);
    }

    match report {
        Some(report) if report.completed != total => error!(
            "Lookup pool completed {} of {} jobs",
            report.completed, total
        ),
        Some(_) => {}
        None => error!("Lookup pool stopped without reporting completion"),
    }

    if !results.is_complete() {
        error!(
            "Collected {} outcomes for {} songs",
            results.matched.len() + results.unmatched.len(),
            total
        );
    }

    results
}

/// Receive until every sender is gone.
async fn drain<T>(rx: &mut mpsc::Receiver<T>, into: &mut Vec<T>) {
    while let Some(item) = rx.recv().await {
        into.push(item);
    }
}
