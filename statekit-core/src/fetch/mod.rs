//! Network Fetch Utility
//!
//! Issues a single outstanding request per configuration, parses the
//! response, retries on HTTP failure with a caller-supplied backoff, and
//! discards stale in-flight requests.
//!
//! # Request lifecycle
//!
//! 1. `load(url, options)` is an input change: the attempt counter resets to
//!    one and a new request is issued against the injected [`Transport`].
//!
//! 2. While the request is outstanding the snapshot reads `loading = true`.
//!    On completion `ok` and `http_status` reflect the response; on HTTP
//!    success the body is parsed per [`ParseMode`]; on HTTP failure the data
//!    stays unset and the retry policy is consulted.
//!
//! 3. With `discard_stale` (the default), starting a new request cancels the
//!    previous one, and a cancelled request's eventual resolution never
//!    updates state. With `discard_stale = false` every request runs to
//!    completion and whichever resolves last wins.
//!
//! # Cancellation
//!
//! Each issued request is stamped with a generation. Aborting the previous
//! task stops it at its next suspension point; the generation check before
//! every state write covers the race where a response has already resolved
//! by the time the abort lands.

mod parse;
mod transport;

pub use parse::{Document, DocumentKind, ParseMode, Payload};
pub use transport::{Request, RequestOptions, Response, Transport, TransportError};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::reactive::{Cell, WatcherId};

/// Backoff policy: maps the attempt count (starting at 1) to the delay
/// before the next attempt, or `None` to stop retrying.
pub type RetryDelay = Arc<dyn Fn(u32) -> Option<Duration> + Send + Sync>;

/// Configuration for a fetch.
#[derive(Clone)]
pub struct FetchOptions {
    /// How to parse the response body. Defaults to [`ParseMode::Json`].
    pub parse_mode: ParseMode,
    /// Extra request configuration passed to the transport unchanged.
    pub request: RequestOptions,
    /// Cancel the previous in-flight request when a new one starts and
    /// discard its result. Defaults to true. Only turn this off if you
    /// really want last-resolver-wins semantics.
    pub discard_stale: bool,
    /// Retry backoff consulted after an HTTP-level failure. `None` disables
    /// retrying entirely.
    pub retry_delay: Option<RetryDelay>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self {
            parse_mode: ParseMode::Json,
            request: RequestOptions::default(),
            discard_stale: true,
            retry_delay: None,
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a fetch currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Done,
    Failed,
}

/// Read-only view of the fetch state.
#[derive(Debug, Clone, Default)]
pub struct FetchSnapshot {
    /// The parsed response. Unset until a successful fetch completes, and
    /// unset again after an HTTP failure.
    pub data: Option<Payload>,
    /// True from request start until its outcome is applied.
    pub loading: bool,
    /// Whether the last completed response had a 2xx status.
    pub ok: bool,
    /// The HTTP status code of the last completed response.
    pub http_status: Option<u16>,
    pub phase: Phase,
}

struct Inner {
    transport: Arc<dyn Transport>,
    state: Cell<FetchSnapshot>,
    /// Stamp of the most recently issued request.
    generation: AtomicU64,
    alive: AtomicBool,
    /// Task of the in-flight request; tracked only under discard_stale.
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

/// The fetch utility. One outstanding request per configuration.
///
/// Must be used inside a tokio runtime; requests run as spawned tasks.
pub struct Fetcher {
    inner: Arc<Inner>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                state: Cell::new(FetchSnapshot::default()),
                generation: AtomicU64::new(0),
                alive: AtomicBool::new(true),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> FetchSnapshot {
        self.inner.state.get()
    }

    /// Register a re-render trigger fired on every state change.
    pub fn watch<F>(&self, notify: F) -> WatcherId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.state.watch(notify)
    }

    pub fn unwatch(&self, id: WatcherId) {
        self.inner.state.unwatch(id);
    }

    /// Issue a request. Equivalent to an input change: the retry counter
    /// resets to one, and under `discard_stale` the previous in-flight
    /// request is cancelled.
    pub fn load(&self, url: impl Into<String>, options: FetchOptions) {
        Inner::start(&self.inner, url.into(), options, 1);
    }

    /// Deactivate. Cancels the in-flight request and guarantees no further
    /// state mutation from any outstanding continuation.
    pub fn dispose(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self
            .inner
            .in_flight
            .lock()
            .expect("in_flight lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

impl Drop for Fetcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Inner {
    fn start(inner: &Arc<Inner>, url: String, options: FetchOptions, attempt: u32) {
        if !inner.alive.load(Ordering::SeqCst) {
            return;
        }

        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if options.discard_stale {
            if let Some(previous) = inner
                .in_flight
                .lock()
                .expect("in_flight lock poisoned")
                .take()
            {
                previous.abort();
            }
        }

        inner.state.update(|s| {
            s.loading = true;
            s.phase = Phase::Loading;
        });

        let discard_stale = options.discard_stale;
        let task = tokio::spawn(Inner::run(
            Arc::clone(inner),
            url,
            options,
            attempt,
            generation,
        ));

        if discard_stale {
            *inner.in_flight.lock().expect("in_flight lock poisoned") = Some(task);
        }
    }

    async fn run(inner: Arc<Inner>, url: String, options: FetchOptions, attempt: u32, generation: u64) {
        tracing::debug!(%url, attempt, "issuing request");

        let request = options.request.clone().into_request(url.clone());
        match inner.transport.send(request).await {
            Err(error) => {
                // Transport failures are swallowed: loading stops, data
                // stays unset, no retry from this branch.
                tracing::debug!(%url, %error, "request failed at transport level");
                if inner.may_apply(generation, options.discard_stale) {
                    inner.state.update(|s| {
                        s.loading = false;
                        s.phase = Phase::Failed;
                    });
                }
            }
            Ok(response) => {
                if !inner.may_apply(generation, options.discard_stale) {
                    return;
                }

                let status = response.status;
                if response.ok() {
                    let data = parse::parse_body(options.parse_mode, response);
                    inner.state.update(|s| {
                        s.http_status = Some(status);
                        s.ok = true;
                        s.data = data;
                        s.loading = false;
                        s.phase = Phase::Done;
                    });
                } else {
                    inner.state.update(|s| {
                        s.http_status = Some(status);
                        s.ok = false;
                        s.data = None;
                        s.loading = false;
                        s.phase = Phase::Failed;
                    });

                    if let Some(retry) = options.retry_delay.clone() {
                        if let Some(delay) = retry(attempt) {
                            tokio::time::sleep(delay).await;
                            // A newer load supersedes the scheduled retry.
                            if inner.is_current(generation) {
                                Inner::start(&inner, url, options, attempt + 1);
                            }
                        }
                    }
                }
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.alive.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    fn may_apply(&self, generation: u64, discard_stale: bool) -> bool {
        if !self.alive.load(Ordering::SeqCst) {
            return false;
        }
        // Without stale discarding every completion applies: last writer wins.
        !discard_stale || self.generation.load(Ordering::SeqCst) == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::AtomicU32;

    /// Transport fake that answers per-URL with a scripted delay, status,
    /// and body, counting every request it sees.
    struct ScriptedTransport {
        routes: Vec<(String, Duration, u16, String)>,
        requests: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(routes: Vec<(&str, Duration, u16, &str)>) -> Arc<Self> {
            Arc::new(Self {
                routes: routes
                    .into_iter()
                    .map(|(url, delay, status, body)| {
                        (url.to_string(), delay, status, body.to_string())
                    })
                    .collect(),
                requests: AtomicU32::new(0),
            })
        }

        fn request_count(&self) -> u32 {
            self.requests.load(Ordering::SeqCst)
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: Request) -> BoxFuture<'static, Result<Response, TransportError>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let route = self.routes.iter().find(|(url, ..)| *url == request.url).cloned();
            Box::pin(async move {
                match route {
                    Some((_, delay, status, body)) => {
                        tokio::time::sleep(delay).await;
                        Ok(Response { status, body })
                    }
                    None => Err(TransportError::Connection("no route".to_string())),
                }
            })
        }
    }

    async fn settle() {
        // Paused-time runtimes auto-advance through every pending timer.
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_and_parses_json() {
        let transport = ScriptedTransport::new(vec![(
            "/api",
            Duration::from_millis(5),
            200,
            r#"{"message":"Success"}"#,
        )]);
        let fetcher = Fetcher::new(transport.clone());

        fetcher.load("/api", FetchOptions::new());
        let snapshot = fetcher.snapshot();
        assert!(snapshot.loading);
        assert_eq!(snapshot.phase, Phase::Loading);
        assert!(snapshot.data.is_none());

        settle().await;
        let snapshot = fetcher.snapshot();
        assert!(!snapshot.loading);
        assert!(snapshot.ok);
        assert_eq!(snapshot.http_status, Some(200));
        assert_eq!(snapshot.phase, Phase::Done);
        match snapshot.data {
            Some(Payload::Json(value)) => assert_eq!(value["message"], "Success"),
            other => panic!("expected JSON payload, got {other:?}"),
        }
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn http_failure_leaves_data_unset() {
        let transport = ScriptedTransport::new(vec![(
            "/missing",
            Duration::from_millis(5),
            404,
            "not found",
        )]);
        let fetcher = Fetcher::new(transport);

        fetcher.load("/missing", FetchOptions::new());
        settle().await;

        let snapshot = fetcher.snapshot();
        assert!(!snapshot.loading);
        assert!(!snapshot.ok);
        assert_eq!(snapshot.http_status, Some(404));
        assert_eq!(snapshot.phase, Phase::Failed);
        assert!(snapshot.data.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_is_swallowed_without_retry() {
        let transport = ScriptedTransport::new(vec![]);
        let fetcher = Fetcher::new(transport.clone());

        let mut options = FetchOptions::new();
        options.retry_delay = Some(Arc::new(|_| Some(Duration::from_millis(1))));
        fetcher.load("/unreachable", options);
        settle().await;

        let snapshot = fetcher.snapshot();
        assert!(!snapshot.loading);
        assert!(!snapshot.ok);
        assert!(snapshot.http_status.is_none());
        assert!(snapshot.data.is_none());
        // The retry policy only applies to HTTP-level failures.
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_request_never_updates_state() {
        let transport = ScriptedTransport::new(vec![
            ("/slow", Duration::from_millis(50), 200, r#""slow""#),
            ("/fast", Duration::from_millis(5), 200, r#""fast""#),
        ]);
        let fetcher = Fetcher::new(transport);

        fetcher.load("/slow", FetchOptions::new());
        fetcher.load("/fast", FetchOptions::new());
        settle().await;

        match fetcher.snapshot().data {
            Some(Payload::Json(value)) => assert_eq!(value, "fast"),
            other => panic!("expected payload from the last issued request, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn without_discard_last_resolver_wins() {
        let transport = ScriptedTransport::new(vec![
            ("/slow", Duration::from_millis(50), 200, r#""slow""#),
            ("/fast", Duration::from_millis(5), 200, r#""fast""#),
        ]);
        let fetcher = Fetcher::new(transport);

        let mut options = FetchOptions::new();
        options.discard_stale = false;
        fetcher.load("/slow", options.clone());
        fetcher.load("/fast", options);
        settle().await;

        // The slow response resolves after the fast one and overwrites it.
        match fetcher.snapshot().data {
            Some(Payload::Json(value)) => assert_eq!(value, "slow"),
            other => panic!("expected payload from the last resolver, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_policy_gives_up() {
        let transport = ScriptedTransport::new(vec![(
            "/flaky",
            Duration::from_millis(5),
            503,
            "unavailable",
        )]);
        let fetcher = Fetcher::new(transport.clone());

        let mut options = FetchOptions::new();
        options.retry_delay = Some(Arc::new(|attempt| {
            (attempt < 4).then(|| Duration::from_millis(attempt as u64))
        }));
        fetcher.load("/flaky", options);
        settle().await;

        // Attempts 1 through 3 schedule a retry; attempt 4 stops.
        assert_eq!(transport.request_count(), 4);
        assert_eq!(fetcher.snapshot().phase, Phase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_prevents_late_updates() {
        let transport = ScriptedTransport::new(vec![(
            "/slow",
            Duration::from_millis(50),
            200,
            r#""late""#,
        )]);
        let fetcher = Fetcher::new(transport);

        fetcher.load("/slow", FetchOptions::new());
        let version_at_dispose = {
            fetcher.dispose();
            fetcher.inner.state.version()
        };
        settle().await;

        assert_eq!(fetcher.inner.state.version(), version_at_dispose);
        assert!(fetcher.snapshot().data.is_none());
    }
}
