//! Loads remote images into display surfaces.
//!
//! Each surface has at most one fetch in flight. Results are applied only
//! while the surface still wants the same locator: once after the fetch
//! finishes in the background, and again on the UI context right before
//! the surface is touched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Url;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::domain::entities::{
    ActiveFetch, Bitmap, CancelSignal, FetchId, IntoLocator, bitmap_cost,
};
use crate::domain::errors::{ImageLoadError, LoadOutcome};
use crate::domain::ports::{
    CachePolicy, DEFAULT_REQUEST_TIMEOUT, FetchRequest, FetchResponse, HttpFetcherPort,
    ImageCachePort, ImageDecoderPort, ImageSurface, SharedSurface, TransportError,
};

use super::ui_dispatcher::UiDispatcher;

/// Callback receiving the outcome of a load, always on the UI context.
pub type CompletionCallback = Box<dyn FnOnce(LoadOutcome) + Send + 'static>;

/// Configuration for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Time a fetch may stay outstanding.
    pub request_timeout: Duration,
    /// HTTP cache behavior for fetches.
    pub cache_policy: CachePolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_policy: CachePolicy::ReturnCacheDataElseLoad,
        }
    }
}

/// Coordinates cache lookups, fetches and surface updates.
pub struct ImageLoadCoordinator {
    cache: Arc<dyn ImageCachePort>,
    fetcher: Arc<dyn HttpFetcherPort>,
    decoder: Arc<dyn ImageDecoderPort>,
    ui: UiDispatcher,
    runtime: Handle,
    config: CoordinatorConfig,
    next_fetch: AtomicU64,
}

impl std::fmt::Debug for ImageLoadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoadCoordinator")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl ImageLoadCoordinator {
    /// Creates a coordinator from its collaborators.
    ///
    /// Fetches are spawned on `runtime`; completions are delivered through `ui`.
    #[must_use]
    pub fn new(
        cache: Arc<dyn ImageCachePort>,
        fetcher: Arc<dyn HttpFetcherPort>,
        decoder: Arc<dyn ImageDecoderPort>,
        ui: UiDispatcher,
        runtime: Handle,
    ) -> Self {
        Self {
            cache,
            fetcher,
            decoder,
            ui,
            runtime,
            config: CoordinatorConfig::default(),
            next_fetch: AtomicU64::new(1),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Cancels the surface's in-flight fetch and forgets its locator.
    ///
    /// Safe to call at any time; without an active fetch it only clears
    /// the latest locator.
    pub fn cancel<S: ImageSurface>(&self, surface: &SharedSurface<S>) {
        let mut guard = surface.lock();
        if let Some(id) = guard.request_state_mut().cancel() {
            debug!(fetch = %id, "Cancelled image load");
        }
    }

    /// Returns true while the surface has a fetch outstanding.
    pub fn is_loading<S: ImageSurface>(&self, surface: &SharedSurface<S>) -> bool {
        surface.lock().request_state().is_fetching()
    }

    /// Loads `locator` into `surface`.
    ///
    /// Must be called on the UI context. An unparsable locator is ignored
    /// entirely. Otherwise any previous request for the surface is
    /// cancelled, the placeholder (if any) is shown, and the image is served
    /// from the cache synchronously or fetched in the background.
    /// `on_complete` runs at most once, on the UI context.
    pub fn load<S: ImageSurface>(
        &self,
        surface: &SharedSurface<S>,
        locator: impl IntoLocator,
        placeholder: Option<Bitmap>,
        on_complete: Option<CompletionCallback>,
    ) {
        let Some(url) = locator.into_locator() else {
            debug!("Ignoring unparsable image locator");
            return;
        };

        let mut guard = surface.lock();
        if let Some(id) = guard.request_state_mut().cancel() {
            debug!(fetch = %id, "Superseded previous image load");
        }

        if let Some(placeholder) = placeholder {
            guard.display_placeholder(placeholder);
        }

        let generation = guard.request_state_mut().begin(url.clone());

        if let Some(image) = self.cache.get(&url) {
            trace!(url = %url, "Serving image from memory cache");
            guard.display(image.clone());
            drop(guard);
            if let Some(callback) = on_complete {
                callback(Ok(image));
            }
            return;
        }

        let id = FetchId(self.next_fetch.fetch_add(1, Ordering::Relaxed));
        let (handle, signal) = ActiveFetch::new(id);
        let request = FetchRequest::new(url.clone())
            .with_cache_policy(self.config.cache_policy)
            .with_timeout(self.config.request_timeout);

        let job = FetchJob {
            id,
            generation,
            url,
            request,
            signal,
            surface: Arc::downgrade(surface),
            on_complete,
            fetcher: self.fetcher.clone(),
            decoder: self.decoder.clone(),
            cache: self.cache.clone(),
            ui: self.ui.clone(),
        };

        debug!(fetch = %id, url = %job.url, "Starting image fetch");
        self.runtime.spawn(job.run());

        guard.request_state_mut().attach(handle);
        guard.fetch_started();
    }

    /// Peeks at the cache for `locator` without touching any surface.
    ///
    /// Neither refreshes the entry's recency nor counts as a hit or miss.
    pub fn cached(&self, locator: impl IntoLocator) -> Option<Bitmap> {
        locator.into_locator().and_then(|url| self.cache.peek(&url))
    }

    /// Drops cached bitmaps in response to memory pressure.
    pub fn handle_memory_pressure(&self) {
        let freed = self.cache.total_cost();
        let count = self.cache.purge();
        debug!(count, freed, "Released cached images under memory pressure");
    }
}

/// Everything a background fetch needs, moved into its task.
struct FetchJob<S: ImageSurface> {
    id: FetchId,
    generation: u64,
    url: Url,
    request: FetchRequest,
    signal: CancelSignal,
    surface: Weak<Mutex<S>>,
    on_complete: Option<CompletionCallback>,
    fetcher: Arc<dyn HttpFetcherPort>,
    decoder: Arc<dyn ImageDecoderPort>,
    cache: Arc<dyn ImageCachePort>,
    ui: UiDispatcher,
}

impl<S: ImageSurface> FetchJob<S> {
    async fn run(mut self) {
        let result = tokio::select! {
            biased;
            () = self.signal.cancelled() => Err(TransportError::Cancelled),
            result = self.fetcher.fetch(self.request.clone()) => result,
        };

        if !self.release_and_check() {
            return;
        }

        let response = match result {
            Ok(response) => response,
            Err(TransportError::Cancelled) => {
                debug!(fetch = %self.id, "Fetch cancelled, dropping result");
                return;
            }
            Err(e) => {
                warn!(fetch = %self.id, url = %self.url, error = %e, "Image fetch failed");
                let error = ImageLoadError::transport(e.to_string());
                self.deliver(Err(error));
                return;
            }
        };

        debug!(
            fetch = %self.id,
            status = ?response.status,
            content_type = response.content_type.as_deref().unwrap_or("unknown"),
            from_cache = response.from_cache,
            size = response.body.len(),
            "Fetch finished"
        );

        match decode_response(self.decoder.clone(), response).await {
            Ok(image) => {
                self.cache
                    .insert(self.url.clone(), image.clone(), bitmap_cost(&image));
                debug!(fetch = %self.id, url = %self.url, "Image loaded successfully");
                self.deliver(Ok(image));
            }
            Err(error) => {
                warn!(
                    fetch = %self.id,
                    url = %self.url,
                    status = error.status_code(),
                    error = %error,
                    "Image could not be used"
                );
                self.deliver(Err(error));
            }
        }
    }

    /// Clears this fetch's handle and reports whether its result is still wanted.
    fn release_and_check(&self) -> bool {
        let Some(surface) = self.surface.upgrade() else {
            trace!(fetch = %self.id, "Surface dropped before completion");
            return false;
        };
        let mut guard = surface.lock();
        let state = guard.request_state_mut();
        state.finish(self.id);
        if !state.is_current(&self.url, self.generation) {
            debug!(fetch = %self.id, url = %self.url, "Surface moved on, discarding result");
            return false;
        }
        true
    }

    /// Hands the outcome to the UI context, re-checking relevance there.
    fn deliver(self, outcome: LoadOutcome) {
        let Self {
            id,
            generation,
            url,
            surface,
            on_complete,
            ui,
            ..
        } = self;

        ui.dispatch(move || {
            let Some(surface) = surface.upgrade() else {
                return;
            };
            {
                let mut guard = surface.lock();
                if !guard.request_state().is_current(&url, generation) {
                    debug!(fetch = %id, url = %url, "Superseded before delivery, discarding");
                    return;
                }
                if let Ok(image) = &outcome {
                    guard.display(image.clone());
                }
            }
            if let Some(callback) = on_complete {
                callback(outcome);
            }
        });
    }
}

/// Checks the status and decodes the payload off the async workers.
async fn decode_response(
    decoder: Arc<dyn ImageDecoderPort>,
    response: FetchResponse,
) -> Result<Bitmap, ImageLoadError> {
    let status = response.status;
    if !response.is_success() {
        let message = status.map_or_else(
            || "response carried no HTTP status".to_string(),
            |code| format!("HTTP {code}"),
        );
        return Err(ImageLoadError::decode(status, message));
    }

    let body = response.body;
    let decoded = tokio::task::spawn_blocking(move || decoder.decode(&body))
        .await
        .map_err(|e| ImageLoadError::decode(status, format!("Decode task panicked: {e}")))?
        .map_err(|e| ImageLoadError::decode(status, e.to_string()))?;

    Ok(Arc::new(decoded))
}
