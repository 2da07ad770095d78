//! Pause between matching and playlist writes.
//!
//! Matching fires many searches in a short time. Waiting a moment before
//! the playlist writes lets the rate-limit window recover.

use std::time::Duration;

use tracing::debug;

use crate::api::CatalogClient;

/// Delay policy applied after matching and before creating the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    /// Go straight on.
    None,
    /// Always wait this long.
    Fixed(Duration),
    /// Wait as long as the server's recent back-off, but at least `floor`.
    Adaptive { floor: Duration },
}

impl Default for Cooldown {
    fn default() -> Self {
        Cooldown::Fixed(Duration::from_secs(1))
    }
}

impl Cooldown {
    /// Delay to observe given the client's current back-off hint.
    pub fn delay(&self, backoff_hint: Option<Duration>) -> Duration {
        match *self {
            Cooldown::None => Duration::ZERO,
            Cooldown::Fixed(delay) => delay,
            Cooldown::Adaptive { floor } => backoff_hint.map_or(floor, |hint| hint.max(floor)),
        }
    }

    /// Sleep for the delay this policy picks for `client`.
    pub async fn wait<C>(&self, client: &C)
    where
        C: CatalogClient + ?Sized,
    {
        let delay = self.delay(client.backoff_hint());
        if delay.is_zero() {
            return;
        }
        debug!("Cooling down for {:?} before writing the playlist", delay);
        tokio::time::sleep(delay).await;
    }
}
