//! HTTP fetcher backed by reqwest with an optional disk response cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

use crate::domain::ports::{
    CachePolicy, FetchRequest, FetchResponse, HttpFetcherPort, TransportError,
};

use super::disk_cache::DiskResponseCache;

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 10;

/// Fetches remote images over HTTP(S).
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    response_cache: Option<Arc<DiskResponseCache>>,
}

impl ReqwestFetcher {
    /// Creates a fetcher without a response cache.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            response_cache: None,
        })
    }

    /// Attaches a disk response cache consulted by `ReturnCacheDataElseLoad`.
    #[must_use]
    pub fn with_response_cache(mut self, cache: Arc<DiskResponseCache>) -> Self {
        self.response_cache = Some(cache);
        self
    }

    async fn cached_response(&self, request: &FetchRequest) -> Option<FetchResponse> {
        if request.cache_policy != CachePolicy::ReturnCacheDataElseLoad {
            return None;
        }
        let cache = self.response_cache.as_ref()?;
        let response = cache.get(&request.url).await?;
        debug!(url = %request.url, "Serving response from HTTP cache");
        Some(response)
    }

    /// Persists successful image responses in the background.
    ///
    /// Anything not labelled `image/*` is left out so a URL that once
    /// returned an error page is fetched again next time.
    fn store_response(&self, url: &Url, response: &FetchResponse) {
        let Some(cache) = self.response_cache.clone() else {
            return;
        };
        if !response.is_success() || !response.is_image() {
            debug!(
                url = %url,
                content_type = response.content_type.as_deref().unwrap_or("unknown"),
                "Not caching non-image response"
            );
            return;
        }
        let url = url.clone();
        let response = response.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.put(&url, &response).await {
                warn!(url = %url, error = %e, "Failed to cache response to disk");
            }
        });
    }
}

fn map_transport_error(error: &reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::TimedOut(timeout)
    } else {
        TransportError::Network(format!("Request failed: {error}"))
    }
}

#[async_trait]
impl HttpFetcherPort for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        if let Some(cached) = self.cached_response(&request).await {
            return Ok(cached);
        }

        debug!(url = %request.url, timeout = ?request.timeout, "Downloading image");

        let response = self
            .client
            .get(request.url.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(&e, request.timeout))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(&e, request.timeout))?;

        let mut fetched = FetchResponse::new(status.as_u16(), body);
        fetched.content_type = content_type;
        self.store_response(&request.url, &fetched);

        Ok(fetched)
    }
}
