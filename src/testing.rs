//! Scripted in-memory catalog for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::CatalogClient;
use crate::error::{CatalogError, Result};
use crate::models::{Playlist, Song, Track, TrackId, User};

/// What a search for a given song name returns.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Candidate IDs in ranking order.
    Found(Vec<&'static str>),
    /// A successful search with no candidates.
    Empty,
    /// A failed search.
    Fail,
    /// The lookup panics.
    Panic,
}

#[derive(Debug, Default)]
pub(crate) struct FakeCatalog {
    credentials: bool,
    scripts: HashMap<String, Script>,
    search_delays: HashMap<String, Duration>,
    fail_user: bool,
    fail_create: bool,
    /// 1-based append call that fails.
    fail_append_call: Option<usize>,
    backoff_hint: Option<Duration>,

    pub searches: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub append_calls: AtomicUsize,
    pub appended: Mutex<Vec<Vec<TrackId>>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            credentials: true,
            ..Default::default()
        }
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    pub fn script(mut self, name: &str, script: Script) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    pub fn delay(mut self, name: &str, delay: Duration) -> Self {
        self.search_delays.insert(name.to_string(), delay);
        self
    }

    pub fn failing_user(mut self) -> Self {
        self.fail_user = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_append(mut self, call: usize) -> Self {
        self.fail_append_call = Some(call);
        self
    }

    pub fn with_backoff_hint(mut self, hint: Duration) -> Self {
        self.backoff_hint = Some(hint);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
            + self.user_calls.load(Ordering::SeqCst)
            + self.create_calls.load(Ordering::SeqCst)
            + self.append_calls.load(Ordering::SeqCst)
    }

    pub fn appended_sizes(&self) -> Vec<usize> {
        self.appended.lock().unwrap().iter().map(Vec::len).collect()
    }
}

/// Default match ID for an unscripted song.
pub(crate) fn default_id(name: &str) -> TrackId {
    TrackId::new(format!("id-{}", name))
}

/// Songs named `song-0`, `song-1`, ...
pub(crate) fn songs(count: usize) -> Vec<Song> {
    (0..count)
        .map(|i| Song::new(format!("song-{}", i), "Artist", "Album"))
        .collect()
}

fn song_name(query: &str) -> &str {
    query
        .strip_prefix("track:")
        .and_then(|rest| rest.split(" artist:").next())
        .unwrap_or(query)
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let name = song_name(query);
        let delay = self
            .search_delays
            .get(name)
            .copied()
            .unwrap_or(Duration::from_millis(1));
        tokio::time::sleep(delay).await;

        let track = |id: &str| Track {
            id: TrackId::new(id),
            name: name.to_string(),
            ..Default::default()
        };

        match self.scripts.get(name) {
            None => Ok(vec![track(default_id(name).as_str())]),
            Some(Script::Found(ids)) => Ok(ids.iter().map(|id| track(*id)).collect()),
            Some(Script::Empty) => Ok(Vec::new()),
            Some(Script::Fail) => Err(CatalogError::Api {
                status: 500,
                message: format!("search for {} failed", name),
            }),
            Some(Script::Panic) => panic!("lookup for {} blew up", name),
        }
    }

    async fn current_user(&self) -> Result<User> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_user {
            return Err(CatalogError::BadCredentials("token revoked".to_string()));
        }
        Ok(User {
            id: "fake-user".to_string(),
            display_name: None,
        })
    }

    async fn create_playlist(&self, _user_id: &str, name: &str) -> Result<Playlist> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(CatalogError::Api {
                status: 403,
                message: "Insufficient client scope".to_string(),
            });
        }
        Ok(Playlist {
            id: "fake-playlist".to_string(),
            name: name.to_string(),
            public: false,
        })
    }

    async fn append_tracks(
        &self,
        _user_id: &str,
        _playlist_id: &str,
        track_ids: &[TrackId],
    ) -> Result<()> {
        let call = self.append_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_append_call == Some(call) {
            return Err(CatalogError::Api {
                status: 502,
                message: "Bad gateway".to_string(),
            });
        }
        self.appended.lock().unwrap().push(track_ids.to_vec());
        Ok(())
    }

    fn backoff_hint(&self) -> Option<Duration> {
        self.backoff_hint
    }
}
