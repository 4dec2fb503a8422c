//! Paginated Loader Utility
//!
//! Fetches bounded batches on demand, accumulates results, detects
//! end-of-data, and supports truncation and an error-continuation policy.
//!
//! # State machine
//!
//! Idle -> Fetching -> Idle, looping, with an absorbing Ended state.
//! `load_more` is a no-op while fetching or after the end was reached.
//! End-of-data is declared when the accumulated count reaches the limit, or
//! when a batch comes back shorter than the configured batch size. A raise
//! of the limit past the accumulated count reopens an ended loader.
//!
//! # Error policy
//!
//! A failing batch fetch counts as an empty batch. It still increments the
//! fetch counter; whether it ends the loader is controlled by
//! `continue_on_error`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use futures_util::future::BoxFuture;

use crate::reactive::{Cell, WatcherId};

/// Opaque error type for caller-supplied batch fetchers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Batch fetcher: takes the number of completed fetches (starting at 0) and
/// produces the next batch. The result length implicitly defines the batch
/// size unless one is configured explicitly.
pub type BatchFn<T> = Arc<dyn Fn(u32) -> BoxFuture<'static, Result<Vec<T>, BoxError>> + Send + Sync>;

/// Maximum number of elements to accumulate, fixed or recomputed per fetch.
#[derive(Clone)]
pub enum Limit {
    Fixed(usize),
    Dynamic(Arc<dyn Fn() -> usize + Send + Sync>),
}

impl Limit {
    fn resolve(&self) -> usize {
        match self {
            Limit::Fixed(limit) => *limit,
            Limit::Dynamic(f) => f(),
        }
    }
}

impl From<usize> for Limit {
    fn from(limit: usize) -> Self {
        Limit::Fixed(limit)
    }
}

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LazyLoadOptions {
    /// Expected number of items per fetch. When set, a shorter batch marks
    /// the end of the data.
    pub batch_size: Option<usize>,
    /// Drop the overflow when a batch pushes past the limit, keeping exactly
    /// `limit` elements. Defaults to true.
    pub truncate: bool,
    /// Keep the loader open after a failed fetch. Defaults to false.
    pub continue_on_error: bool,
}

impl Default for LazyLoadOptions {
    fn default() -> Self {
        Self {
            batch_size: None,
            truncate: true,
            continue_on_error: false,
        }
    }
}

/// Read-only view of the loader state.
#[derive(Debug, Clone)]
pub struct LazySnapshot<T> {
    /// Everything fetched so far, append-only until `clear`.
    pub elements: Vec<T>,
    /// Completed fetch attempts, successes and policy-permitted failures.
    pub fetch_count: u32,
    pub is_fetching: bool,
    /// Terminal until `clear` or a limit raise reopens the loader.
    pub reached_end: bool,
}

impl<T> Default for LazySnapshot<T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            fetch_count: 0,
            is_fetching: false,
            reached_end: false,
        }
    }
}

struct LazyInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fetch: RwLock<BatchFn<T>>,
    limit: RwLock<Limit>,
    options: LazyLoadOptions,
    state: Cell<LazySnapshot<T>>,
    /// Guards against overlapping load_more calls.
    fetching: AtomicBool,
    /// Bumped by `clear`; an in-flight continuation from a previous epoch
    /// discards its result.
    epoch: AtomicU64,
}

/// The paginated loader utility.
pub struct LazyLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<LazyInner<T>>,
}

impl<T> LazyLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(limit: impl Into<Limit>, fetch: BatchFn<T>, options: LazyLoadOptions) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                fetch: RwLock::new(fetch),
                limit: RwLock::new(limit.into()),
                options,
                state: Cell::new(LazySnapshot::default()),
                fetching: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> LazySnapshot<T> {
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

    /// Fetch the next batch and fold it into the accumulated elements.
    ///
    /// No-op while a fetch is in flight or after the end was reached.
    pub async fn load_more(&self) {
        let inner = &self.inner;
        if inner.state.with(|s| s.reached_end) {
            return;
        }
        if inner.fetching.swap(true, Ordering::SeqCst) {
            return;
        }

        let epoch = inner.epoch.load(Ordering::SeqCst);
        inner.state.update(|s| s.is_fetching = true);

        let completed = inner.state.with(|s| s.fetch_count);
        let fetch = inner.fetch.read().expect("fetch lock poisoned").clone();
        let result = fetch(completed).await;

        if inner.epoch.load(Ordering::SeqCst) != epoch {
            // Cleared while the batch was in flight; the result belongs to a
            // state that no longer exists.
            return;
        }

        match result {
            Err(error) => {
                tracing::debug!(%error, "batch fetch failed, treating as empty batch");
                let continue_on_error = inner.options.continue_on_error;
                inner.state.update(|s| {
                    s.fetch_count += 1;
                    s.is_fetching = false;
                    if !continue_on_error {
                        s.reached_end = true;
                    }
                });
            }
            Ok(batch) => {
                let limit = inner.limit.read().expect("limit lock poisoned").resolve();
                let options = inner.options.clone();
                inner.state.update(move |s| {
                    let mut batch = batch;
                    let total = s.elements.len() + batch.len();
                    let short_batch = matches!(
                        options.batch_size,
                        Some(size) if size > 0 && batch.len() < size
                    );

                    if total >= limit || short_batch {
                        s.reached_end = true;
                        let overflow = total.saturating_sub(limit);
                        if options.truncate && overflow > 0 {
                            batch.truncate(batch.len().saturating_sub(overflow));
                        }
                    }

                    s.elements.append(&mut batch);
                    s.fetch_count += 1;
                    s.is_fetching = false;
                });
            }
        }

        inner.fetching.store(false, Ordering::SeqCst);
    }

    /// Reset to the initial state, regardless of the current one. Any batch
    /// still in flight is discarded when it lands.
    pub fn clear(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.fetching.store(false, Ordering::SeqCst);
        self.inner.state.set(LazySnapshot::default());
    }

    /// Replace the batch fetcher. Deliberately does not clear accumulated
    /// state; callers that want a reset call `clear` themselves.
    pub fn set_batch(&self, fetch: BatchFn<T>) {
        *self.inner.fetch.write().expect("fetch lock poisoned") = fetch;
    }

    /// Replace the limit. Raising it past the accumulated count reopens an
    /// ended loader.
    pub fn set_limit(&self, limit: impl Into<Limit>) {
        let limit = limit.into();
        let resolved = limit.resolve();
        *self.inner.limit.write().expect("limit lock poisoned") = limit;

        let reopen = self
            .inner
            .state
            .with(|s| s.reached_end && resolved > s.elements.len());
        if reopen {
            self.inner.state.update(|s| s.reached_end = false);
        }
    }
}

impl<T> Clone for LazyLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
