//! Place-search fetcher
//!
//! This module handles all provider requests for the crawler, including:
//! - Building the HTTP client with a proper user agent string
//! - Rate-limited nearby-search requests
//! - Following continuation tokens until the result set is exhausted
//! - Classifying transport, status and decoding failures

use crate::config::SearchConfig;
use crate::crawler::rate_limiter::RateLimiter;
use crate::grid::GridPoint;
use crate::places::{normalize_page, PlaceRecord, SearchResponse};
use crate::FetchError;
use futures::{Stream, TryStreamExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `timeout_secs` - Total per-request timeout
///
/// # Example
///
/// ```no_run
/// use plan_ville::crawler::build_http_client;
///
/// let client = build_http_client(30).unwrap();
/// ```
pub fn build_http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Where the next page request starts from
enum PageCursor {
    First,
    Next(String),
    Exhausted,
}

/// Queries the provider for one location, page by page
pub struct PlaceFetcher {
    client: Client,
    endpoint: String,
    api_key: String,
    field_mask: String,
    page_cooldown: Duration,
    limiter: Arc<RateLimiter>,
}

impl PlaceFetcher {
    /// Creates a fetcher
    ///
    /// The limiter is shared: every fetcher built from the same `Arc`
    /// draws from the same call budget.
    pub fn new(
        client: Client,
        search: &SearchConfig,
        api_key: impl Into<String>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            endpoint: search.endpoint.clone(),
            api_key: api_key.into(),
            field_mask: search.field_mask.clone(),
            page_cooldown: Duration::from_millis(search.page_cooldown_ms),
            limiter,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Streams the normalized places found around `point`, one page per item
    ///
    /// The stream is lazy: the next page is only requested once the caller
    /// polls for it, after the provider's cooldown for continuation tokens has
    /// elapsed. Each page can therefore be persisted before the next request
    /// is made. The first error ends the stream.
    pub fn fetch(
        &self,
        point: GridPoint,
        radius: u32,
    ) -> impl Stream<Item = Result<Vec<PlaceRecord>, FetchError>> + '_ {
        let location = point.location();

        futures::stream::try_unfold(PageCursor::First, move |cursor| {
            let location = location.clone();
            async move {
                let token = match cursor {
                    PageCursor::Exhausted => return Ok(None),
                    PageCursor::First => None,
                    PageCursor::Next(token) => {
                        // Tokens are rejected until they activate provider-side
                        tokio::time::sleep(self.page_cooldown).await;
                        Some(token)
                    }
                };

                let response = self
                    .request_page(&location, radius, token.as_deref())
                    .await?;

                let next = match response.continuation() {
                    Some(token) => PageCursor::Next(token.to_string()),
                    None => PageCursor::Exhausted,
                };

                Ok::<_, FetchError>(Some((normalize_page(response), next)))
            }
        })
    }

    /// Fetches every page for `point` and returns the union of their places
    pub async fn fetch_all(
        &self,
        point: GridPoint,
        radius: u32,
    ) -> Result<Vec<PlaceRecord>, FetchError> {
        let pages = self.fetch(point, radius);
        futures::pin_mut!(pages);

        let mut places = Vec::new();
        while let Some(page) = pages.try_next().await? {
            places.extend(page);
        }
        Ok(places)
    }

    /// Issues a single rate-limited search request
    async fn request_page(
        &self,
        location: &str,
        radius: u32,
        page_token: Option<&str>,
    ) -> Result<SearchResponse, FetchError> {
        self.limiter.acquire().await;

        let radius = radius.to_string();
        let mut request = self.client.get(&self.endpoint).query(&[
            ("location", location),
            ("radius", radius.as_str()),
            ("key", self.api_key.as_str()),
            ("fields", self.field_mask.as_str()),
        ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        tracing::trace!(
            "Searching {} (radius {}m, continuation: {})",
            location,
            radius,
            page_token.is_some()
        );

        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                location: location.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|source| FetchError::Decode {
                location: location.to_string(),
                source,
            })
    }
}
