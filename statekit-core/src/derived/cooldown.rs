//! Cooldown-gated state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::reactive::{Cell, WatcherId};

/// State whose regular setter is rate-limited.
///
/// [`set`](Self::set) applies the value and opens a cooldown window; further
/// `set` calls inside the window are discarded. [`force_set`](Self::force_set)
/// always applies and leaves the window untouched, so a running cooldown
/// keeps blocking soft sets.
pub struct CooldownState<T: Clone + Send + Sync + 'static> {
    value: Cell<T>,
    delay: Duration,
    blocked: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
}

impl<T: Clone + Send + Sync + 'static> CooldownState<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            value: Cell::new(initial),
            delay,
            blocked: Arc::new(AtomicBool::new(false)),
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Apply `next` unless a cooldown is running. Returns whether the value
    /// was accepted.
    pub fn set(&self, next: T) -> bool {
        if self.disposed.load(Ordering::SeqCst) {
            return false;
        }
        if self.blocked.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.value.set(next);

        let blocked = Arc::clone(&self.blocked);
        let disposed = Arc::clone(&self.disposed);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // A disposed instance must not be mutated by a late unblock.
            if !disposed.load(Ordering::SeqCst) {
                blocked.store(false, Ordering::SeqCst);
            }
        });
        true
    }

    /// Apply `next` unconditionally. Does not start or reset the cooldown.
    /// No-op after `dispose`.
    pub fn force_set(&self, next: T) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        self.value.set(next);
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Whether a soft set would currently be refused.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    pub fn watch<F>(&self, notify: F) -> WatcherId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.value.watch(notify)
    }

    pub fn unwatch(&self, id: WatcherId) {
        self.value.unwatch(id);
    }

    /// Deactivate: further sets are refused and the running cooldown, if
    /// any, never reopens. The current value stays readable.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for CooldownState<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}
