//! Port definition for fetching remote resources over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;

/// Default time a single fetch may stay outstanding.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How a fetch should treat previously cached HTTP responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Always go to the network.
    ReloadIgnoringCache,
    /// Use a cached response if present, otherwise load.
    #[default]
    ReturnCacheDataElseLoad,
}

/// A single fetch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Resource to fetch.
    pub url: Url,
    /// HTTP cache behavior.
    pub cache_policy: CachePolicy,
    /// Upper bound on how long the fetch may take.
    pub timeout: Duration,
}

impl FetchRequest {
    /// Creates a request with the default policy and timeout.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            cache_policy: CachePolicy::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the cache policy.
    #[must_use]
    pub const fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Raw response to a fetch.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status, if the transport produced one.
    pub status: Option<u16>,
    /// Response payload.
    pub body: Bytes,
    /// Content type header, if present.
    pub content_type: Option<String>,
    /// True if served from the HTTP response cache.
    pub from_cache: bool,
}

impl FetchResponse {
    /// Creates a network response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
            content_type: None,
            from_cache: false,
        }
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns true if the status is within 200–299.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..=299).contains(&s))
    }

    /// Returns true if the server labelled the body as an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| {
            ct.trim_start()
                .get(..6)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
        })
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The fetch was cancelled on purpose.
    #[error("request cancelled")]
    Cancelled,
    /// The fetch exceeded its timeout.
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
    /// Any other network failure.
    #[error("network error: {0}")]
    Network(String),
}

/// Port for the HTTP client collaborator.
#[async_trait]
pub trait HttpFetcherPort: Send + Sync {
    /// Performs the request, honoring its cache policy and timeout.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use tokio::sync::Notify;

    /// Encodes a solid PNG for use as a response body.
    pub fn encoded_png(width: u32, height: u32) -> Bytes {
        let img = image::DynamicImage::new_rgba8(width, height);
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .expect("png encoding");
        Bytes::from(buf.into_inner())
    }

    /// Scripted fetcher for testing.
    #[derive(Default)]
    pub struct MockFetcher {
        responses: Mutex<HashMap<Url, Result<FetchResponse, TransportError>>>,
        gates: Mutex<HashMap<Url, Arc<Notify>>>,
        requests: Mutex<Vec<FetchRequest>>,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        /// Creates a fetcher with nothing scripted.
        pub fn new() -> Self {
            Self::default()
        }

        /// Scripts a response for `url`.
        pub fn respond(&self, url: &Url, response: FetchResponse) {
            self.responses.lock().insert(url.clone(), Ok(response));
        }

        /// Scripts a PNG of the given size for `url`.
        pub fn respond_png(&self, url: &Url, width: u32, height: u32) {
            self.respond(url, FetchResponse::new(200, encoded_png(width, height)));
        }

        /// Scripts a transport failure for `url`.
        pub fn fail(&self, url: &Url, error: TransportError) {
            self.responses.lock().insert(url.clone(), Err(error));
        }

        /// Makes fetches for `url` wait until [`Self::release`] is called.
        pub fn hold(&self, url: &Url) {
            self.gates
                .lock()
                .insert(url.clone(), Arc::new(Notify::new()));
        }

        /// Lets one held fetch for `url` proceed.
        pub fn release(&self, url: &Url) {
            if let Some(gate) = self.gates.lock().get(url) {
                gate.notify_one();
            }
        }

        /// Number of fetches started.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Requests received so far.
        pub fn requests(&self) -> Vec<FetchRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl HttpFetcherPort for MockFetcher {
        async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push(request.clone());

            let gate = self.gates.lock().get(&request.url).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            self.responses
                .lock()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Network("no response scripted".into())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let url = Url::parse("https://example.com/a.png").unwrap();
        let request = FetchRequest::new(url);
        assert_eq!(request.cache_policy, CachePolicy::ReturnCacheDataElseLoad);
        assert_eq!(request.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_success_range() {
        assert!(FetchResponse::new(200, Bytes::new()).is_success());
        assert!(FetchResponse::new(299, Bytes::new()).is_success());
        assert!(!FetchResponse::new(304, Bytes::new()).is_success());
        assert!(!FetchResponse::new(404, Bytes::new()).is_success());

        let mut no_status = FetchResponse::new(200, Bytes::new());
        no_status.status = None;
        assert!(!no_status.is_success());
    }

    #[test]
    fn test_image_content_type() {
        let png = FetchResponse::new(200, Bytes::new()).with_content_type("image/png");
        let upper = FetchResponse::new(200, Bytes::new()).with_content_type("Image/WEBP");
        let html = FetchResponse::new(200, Bytes::new()).with_content_type("text/html; charset=utf-8");

        assert!(png.is_image());
        assert!(upper.is_image());
        assert!(!html.is_image());
        assert!(!FetchResponse::new(200, Bytes::new()).is_image());
    }
}
