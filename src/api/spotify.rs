//! Spotify Web API client.
//!
//! This module provides a client for the Spotify Web API
//! (api.spotify.com). It expects an already-issued OAuth access token;
//! obtaining and refreshing tokens happens elsewhere.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use super::{CatalogClient, MAX_APPEND_BATCH};
use crate::converters;
use crate::error::{CatalogError, Result};
use crate::models::{Playlist, Track, TrackId, User};

/// Base URL for the Spotify Web API.
const API_BASE_URL: &str = "https://api.spotify.com/v1/";

/// Candidates requested per search unless configured otherwise.
const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Largest page the search endpoint serves.
pub const MAX_SEARCH_LIMIT: u32 = 50;

/// How long a rate-limited response keeps informing [`CatalogClient::backoff_hint`].
const BACKOFF_MEMORY: Duration = Duration::from_secs(60);

/// How rate-limited requests are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Give up after this many consecutive 429s. `None` retries forever.
    pub max_retries: Option<u32>,
    /// Wait used when a 429 carries no usable `Retry-After` header.
    pub fallback_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: None,
            fallback_wait: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default)]
struct Backoff {
    /// Total 429 responses seen by this client.
    retries: u64,
    /// Longest back-off requested since the hint was last read, and when
    /// the latest 429 arrived.
    recent: Option<(Duration, Instant)>,
}

/// Spotify Web API client.
///
/// Cheap to clone; clones share the rate-limit state.
///
/// # Example
///
/// ```rust,no_run
/// use tunebridge::{CatalogClient, SpotifyApi};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = SpotifyApi::new("access-token")?;
///     let tracks = api.search_tracks("track:Yesterday artist:The Beatles").await?;
///     println!("{} candidates", tracks.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    client: Client,
    base_url: Url,
    access_token: String,
    retry: RetryPolicy,
    search_limit: u32,
    backoff: Arc<Mutex<Backoff>>,
}

impl SpotifyApi {
    /// Create a client for the public Spotify endpoint.
    pub fn new(access_token: &str) -> Result<Self> {
        Self::with_base_url(access_token, API_BASE_URL)
    }

    /// Create a client against another base URL (a proxy or a mock server).
    pub fn with_base_url(access_token: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder().user_agent("tunebridge/0.1").build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            access_token: access_token.trim().to_string(),
            retry: RetryPolicy::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            backoff: Arc::new(Mutex::new(Backoff::default())),
        })
    }

    /// Set the rate-limit retry policy.
    pub fn set_retry_policy(&mut self, retry: RetryPolicy) {
        self.retry = retry;
    }

    /// Get the rate-limit retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Set how many candidates a search asks for, clamped to `1..=50`.
    ///
    /// Matching only uses the first candidate; a larger page only matters
    /// for callers inspecting the results themselves.
    pub fn set_search_limit(&mut self, limit: u32) {
        self.search_limit = limit.clamp(1, MAX_SEARCH_LIMIT);
    }

    /// Get the number of candidates a search asks for.
    pub fn search_limit(&self) -> u32 {
        self.search_limit
    }

    /// Number of rate-limited responses seen so far.
    pub fn rate_limit_retries(&self) -> u64 {
        self.backoff().retries
    }

    fn backoff(&self) -> std::sync::MutexGuard<'_, Backoff> {
        self.backoff.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn note_backoff(&self, wait: Duration) {
        let mut backoff = self.backoff();
        backoff.retries += 1;
        let longest = backoff.recent.map_or(wait, |(seen, _)| seen.max(wait));
        backoff.recent = Some((longest, Instant::now()));
    }

    /// Endpoint URL below the base; each segment is percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor, the base always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request, waiting out 429 responses.
    ///
    /// `build` is called once per attempt since a sent request is consumed.
    async fn send<F>(&self, build: F) -> Result<Value>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempts = 0u32;

        loop {
            let response = build().bearer_auth(&self.access_token).send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after(response.headers()).unwrap_or(self.retry.fallback_wait);
                self.note_backoff(wait);

                if self.retry.max_retries.is_some_and(|max| attempts >= max) {
                    error!("Rate limit retries exhausted after {} attempts", attempts);
                    return Err(CatalogError::RateLimited { retry_after: wait });
                }

                attempts += 1;
                warn!("Rate limited, retrying in {:?} (attempt {})", wait, attempts);
                tokio::time::sleep(wait).await;
                continue;
            }

            let text = response.text().await?;

            if status.is_success() {
                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                return Ok(serde_json::from_str(&text)?);
            }

            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| converters::parse_error_message(&body))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                });
            error!("Spotify API error ({}): {}", status, message);

            return Err(match status {
                StatusCode::UNAUTHORIZED => CatalogError::BadCredentials(message),
                StatusCode::NOT_FOUND => CatalogError::NotFound(message),
                _ => CatalogError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }
    }
}

/// Parse a `Retry-After` header given in whole seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl CatalogClient for SpotifyApi {
    fn has_credentials(&self) -> bool {
        !self.access_token.is_empty()
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        let url = self.url(&["search"]);
        let limit = self.search_limit.to_string();
        debug!("GET {} q={:?}", url, query);

        let response = self
            .send(|| {
                self.client
                    .get(url.clone())
                    .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            })
            .await?;

        converters::parse_search_tracks(&response)
    }

    async fn current_user(&self) -> Result<User> {
        let url = self.url(&["me"]);
        debug!("GET {}", url);

        let response = self.send(|| self.client.get(url.clone())).await?;
        converters::parse_user(&response)
    }

    async fn create_playlist(&self, user_id: &str, name: &str) -> Result<Playlist> {
        let url = self.url(&["users", user_id, "playlists"]);
        let body = json!({
            "name": name,
            "public": false,
        });
        debug!("POST {}", url);

        let response = self.send(|| self.client.post(url.clone()).json(&body)).await?;
        converters::parse_playlist(&response)
    }

    async fn append_tracks(
        &self,
        _user_id: &str,
        playlist_id: &str,
        track_ids: &[TrackId],
    ) -> Result<()> {
        if track_ids.len() > MAX_APPEND_BATCH {
            return Err(CatalogError::Api {
                status: 400,
                message: format!(
                    "cannot append {} tracks in one request (max {})",
                    track_ids.len(),
                    MAX_APPEND_BATCH
                ),
            });
        }

        let url = self.url(&["playlists", playlist_id, "tracks"]);
        let body = json!({
            "uris": track_ids.iter().map(TrackId::uri).collect::<Vec<_>>(),
        });
        debug!("POST {} ({} tracks)", url, track_ids.len());

        self.send(|| self.client.post(url.clone()).json(&body)).await?;
        Ok(())
    }

    /// Longest `Retry-After` seen since the previous call, if the latest
    /// 429 arrived within the last minute. Reading the hint clears it.
    fn backoff_hint(&self) -> Option<Duration> {
        self.backoff()
            .recent
            .take()
            .filter(|(_, seen)| seen.elapsed() <= BACKOFF_MEMORY)
            .map(|(wait, _)| wait)
            .filter(|wait| !wait.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(3)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_endpoint_urls_with_and_without_trailing_slash() {
        let api = SpotifyApi::with_base_url("token", "http://localhost:9000/v1").unwrap();
        assert_eq!(api.url(&["me"]).as_str(), "http://localhost:9000/v1/me");

        let api = SpotifyApi::new("token").unwrap();
        assert_eq!(api.url(&["me"]).as_str(), "https://api.spotify.com/v1/me");
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let api = SpotifyApi::new("token").unwrap();
        let url = api.url(&["users", "old/user #1", "playlists"]);
        assert_eq!(
            url.as_str(),
            "https://api.spotify.com/v1/users/old%2Fuser%20%231/playlists"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            SpotifyApi::with_base_url("token", "not a url"),
            Err(CatalogError::InvalidUrl(_))
        ));
        assert!(matches!(
            SpotifyApi::with_base_url("token", "mailto:someone@example.com"),
            Err(CatalogError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_search_limit_is_clamped() {
        let mut api = SpotifyApi::new("token").unwrap();
        assert_eq!(api.search_limit(), DEFAULT_SEARCH_LIMIT);

        api.set_search_limit(0);
        assert_eq!(api.search_limit(), 1);
        api.set_search_limit(500);
        assert_eq!(api.search_limit(), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn test_blank_token_has_no_credentials() {
        assert!(!SpotifyApi::new("   ").unwrap().has_credentials());
        assert!(SpotifyApi::new("abc").unwrap().has_credentials());
    }

    #[test]
    fn test_backoff_hint_reports_longest_recent_wait() {
        let api = SpotifyApi::new("token").unwrap();
        assert_eq!(api.backoff_hint(), None);

        api.note_backoff(Duration::from_secs(30));
        api.note_backoff(Duration::from_secs(1));
        assert_eq!(api.rate_limit_retries(), 2);
        assert_eq!(api.backoff_hint(), Some(Duration::from_secs(30)));

        // Cleared once read.
        assert_eq!(api.backoff_hint(), None);
    }

    #[test]
    fn test_stale_backoff_is_forgotten() {
        let api = SpotifyApi::new("token").unwrap();
        api.note_backoff(Duration::from_secs(5));
        if let Some(past) = Instant::now().checked_sub(BACKOFF_MEMORY + Duration::from_secs(1)) {
            api.backoff().recent = Some((Duration::from_secs(5), past));
            assert_eq!(api.backoff_hint(), None);
        }
    }
}
