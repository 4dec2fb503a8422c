//! Debounced value.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::reactive::{Cell, WatcherId};

/// Holds a value that only commits once its input has stopped changing for
/// a full quiet period.
///
/// Every [`push`](Self::push) re-arms the timer; pushes arriving before the
/// previous timer fires supersede it, so a burst of N pushes within the
/// delay window commits exactly once, with the final value.
pub struct Debounced<T: Clone + Send + Sync + 'static> {
    value: Cell<T>,
    delay: Duration,
    epoch: Arc<AtomicU64>,
    disposed: AtomicBool,
}

impl<T: Clone + Send + Sync + 'static> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            value: Cell::new(initial),
            delay,
            epoch: Arc::new(AtomicU64::new(0)),
            disposed: AtomicBool::new(false),
        }
    }

    /// Schedule `next` to commit after the quiet period. Supersedes any
    /// pending commit. No-op after `dispose`.
    pub fn push(&self, next: T) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let armed = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let epoch = Arc::clone(&self.epoch);
        let value = self.value.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // A later push moved the epoch on; this timer lost.
            if epoch.load(Ordering::SeqCst) == armed {
                value.set(next);
            }
        });
    }

    /// The last committed value. Pending pushes are not visible here.
    pub fn get(&self) -> T {
        self.value.get()
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

    /// Deactivate: any pending commit is cancelled and further pushes are
    /// ignored. The committed value stays readable.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}
