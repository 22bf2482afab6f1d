//! Per-surface request bookkeeping.

use reqwest::Url;
use tokio::sync::watch;

/// Identifier of one fetch started by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchId(pub u64);

impl std::fmt::Display for FetchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ownership handle to an in-flight fetch.
///
/// Dropping the handle cancels the fetch, so discarding a surface
/// aborts its outstanding work without a separate teardown call.
#[derive(Debug)]
pub struct ActiveFetch {
    id: FetchId,
    cancel_tx: watch::Sender<bool>,
}

impl ActiveFetch {
    /// Creates a handle plus the signal the background fetch listens on.
    #[must_use]
    pub fn new(id: FetchId) -> (Self, CancelSignal) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        (Self { id, cancel_tx }, CancelSignal { rx: cancel_rx })
    }

    /// Returns the fetch identifier.
    #[must_use]
    pub const fn id(&self) -> FetchId {
        self.id
    }

    /// Signals the fetch to abort.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }
}

/// Receiving side of a fetch's cancellation.
#[derive(Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Resolves once the fetch is cancelled or its handle is dropped.
    pub async fn cancelled(&mut self) {
        // A closed channel means the owning surface went away.
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Request state owned by every display surface.
///
/// Invariants: `active` is present only while a fetch is outstanding, and
/// a fetch's result is applied only while `latest_locator` still names
/// the locator that fetch was started for. `generation` changes on every
/// request and every cancel, so a result outlives neither even when the
/// same locator is requested again.
#[derive(Debug, Default)]
pub struct SurfaceRequestState {
    active: Option<ActiveFetch>,
    latest_locator: Option<Url>,
    generation: u64,
}

impl SurfaceRequestState {
    /// Creates an idle state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: None,
            latest_locator: None,
            generation: 0,
        }
    }

    /// Identifies the current request; see [`Self::begin`].
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Most recently requested locator, if any.
    #[must_use]
    pub const fn latest_locator(&self) -> Option<&Url> {
        self.latest_locator.as_ref()
    }

    /// Identifier of the in-flight fetch, if any.
    #[must_use]
    pub fn active_fetch(&self) -> Option<FetchId> {
        self.active.as_ref().map(ActiveFetch::id)
    }

    /// Returns true while a fetch is outstanding.
    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.active.is_some()
    }

    /// Returns true if the request `generation` for `locator` is still
    /// the one this surface wants.
    #[must_use]
    pub fn is_current(&self, locator: &Url, generation: u64) -> bool {
        self.generation == generation && self.latest_locator.as_ref() == Some(locator)
    }

    /// Cancels any in-flight fetch and forgets the latest locator.
    /// Returns the cancelled fetch, if there was one.
    pub fn cancel(&mut self) -> Option<FetchId> {
        let cancelled = self.active.take().map(|fetch| {
            fetch.cancel();
            fetch.id()
        });
        self.latest_locator = None;
        self.generation = self.generation.wrapping_add(1);
        cancelled
    }

    /// Starts a new request for `locator` and returns its generation.
    pub fn begin(&mut self, locator: Url) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.latest_locator = Some(locator);
        self.generation
    }

    /// Takes ownership of a freshly started fetch.
    pub fn attach(&mut self, fetch: ActiveFetch) {
        if let Some(previous) = self.active.replace(fetch) {
            previous.cancel();
        }
    }

    /// Clears the active fetch if it is still `id`.
    /// Returns true if the handle was cleared.
    pub fn finish(&mut self, id: FetchId) -> bool {
        if self.active_fetch() == Some(id) {
            self.active = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut state = SurfaceRequestState::new();
        assert_eq!(state.cancel(), None);
        assert_eq!(state.cancel(), None);
        assert!(!state.is_fetching());
        assert!(state.latest_locator().is_none());
    }

    #[tokio::test]
    async fn test_cancel_signals_fetch() {
        let mut state = SurfaceRequestState::new();
        let (fetch, mut signal) = ActiveFetch::new(FetchId(1));
        state.begin(url("https://example.com/a.png"));
        state.attach(fetch);

        assert_eq!(state.cancel(), Some(FetchId(1)));
        assert!(state.latest_locator().is_none());
        tokio::time::timeout(std::time::Duration::from_secs(1), signal.cancelled())
            .await
            .expect("cancel should wake the fetch");
    }

    #[test]
    fn test_finish_only_clears_own_fetch() {
        let mut state = SurfaceRequestState::new();
        let (fetch, _signal) = ActiveFetch::new(FetchId(2));
        state.attach(fetch);

        assert!(!state.finish(FetchId(1)));
        assert_eq!(state.active_fetch(), Some(FetchId(2)));
        assert!(state.finish(FetchId(2)));
        assert!(!state.is_fetching());
    }

    #[tokio::test]
    async fn test_dropping_handle_wakes_fetch() {
        let (fetch, mut signal) = ActiveFetch::new(FetchId(3));
        drop(fetch);
        tokio::time::timeout(std::time::Duration::from_secs(1), signal.cancelled())
            .await
            .expect("closed channel should resolve");
    }

    #[test]
    fn test_is_current() {
        let mut state = SurfaceRequestState::new();
        let a = url("https://example.com/a.png");
        let b = url("https://example.com/b.png");
        let generation = state.begin(a.clone());
        assert!(state.is_current(&a, generation));
        assert!(!state.is_current(&b, generation));
    }

    #[test]
    fn test_same_locator_after_cancel_is_a_new_request() {
        let mut state = SurfaceRequestState::new();
        let a = url("https://example.com/a.png");

        let first = state.begin(a.clone());
        state.cancel();
        let second = state.begin(a.clone());

        assert_ne!(first, second);
        assert!(!state.is_current(&a, first));
        assert!(state.is_current(&a, second));
        assert_eq!(state.generation(), second);
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let (fetch, mut signal) = ActiveFetch::new(FetchId(4));
        fetch.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), signal.cancelled())
            .await
            .expect("cancel signal should resolve");
    }
}
