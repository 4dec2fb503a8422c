//! Reactive Cell
//!
//! A Cell is the minimal unit of state in this crate: a value plus a
//! re-render trigger. Every utility owns one or more cells and mutates them
//! exclusively through its own setters.
//!
//! # How Cells Work
//!
//! 1. A consuming component registers a watcher callback (its re-render
//!    trigger) with `watch`.
//!
//! 2. When the cell's value is written, the version counter is bumped and
//!    all watchers are notified. Coalescing of notifications is owned by the
//!    host framework, not by the cell.
//!
//! 3. When the component deactivates, it removes its watcher with `unwatch`.
//!    A removed watcher is never notified again.
//!
//! # Thread Safety
//!
//! The value is protected by a RwLock and the version counter is atomic, so
//! cells can be read from watcher callbacks and written from asynchronous
//! continuations without extra coordination.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::id::WatcherId;

/// A piece of state plus a re-render trigger.
///
/// Cloning a `Cell` shares the underlying state: both handles read and write
/// the same value and notify the same watchers.
///
/// # Example
///
/// ```rust,ignore
/// let cell = Cell::new(0);
///
/// let id = cell.watch(|| println!("changed"));
///
/// cell.set(5); // Prints: "changed"
/// cell.unwatch(id);
/// ```
pub struct Cell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// The current value, protected by RwLock for thread safety.
    value: Arc<RwLock<T>>,

    /// Monotonic write counter. Bumped once per committed write.
    version: Arc<AtomicU64>,

    /// Watcher registry. Each entry pairs a watcher ID with its
    /// notification callback.
    watchers: Arc<RwLock<Vec<(WatcherId, Watcher)>>>,
}

type Watcher = Arc<dyn Fn() + Send + Sync>;

impl<T> Cell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new cell with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
            version: Arc::new(AtomicU64::new(0)),
            watchers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().expect("value lock poisoned").clone()
    }

    /// Read the current value through a closure without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read().expect("value lock poisoned"))
    }

    /// Replace the value, bump the version, and notify watchers.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.value.write().expect("value lock poisoned");
            *guard = value;
        }
        self.commit();
    }

    /// Mutate the value in place, bump the version, and notify watchers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut guard = self.value.write().expect("value lock poisoned");
            f(&mut guard);
        }
        self.commit();
    }

    /// The number of committed writes so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Register a watcher callback, invoked after every committed write.
    pub fn watch<F>(&self, notify: F) -> WatcherId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = WatcherId::new();
        self.watchers
            .write()
            .expect("watchers lock poisoned")
            .push((id, Arc::new(notify)));
        id
    }

    /// Remove a watcher. After this call the callback is never invoked again.
    pub fn unwatch(&self, id: WatcherId) {
        self.watchers
            .write()
            .expect("watchers lock poisoned")
            .retain(|(watcher, _)| *watcher != id);
    }

    /// Get the number of registered watchers.
    pub fn watcher_count(&self) -> usize {
        self.watchers.read().expect("watchers lock poisoned").len()
    }

    fn commit(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
        // Snapshot the callbacks first so a watcher can watch or unwatch
        // this cell without deadlocking against the registry.
        let watchers: Vec<Watcher> = self
            .watchers
            .read()
            .expect("watchers lock poisoned")
            .iter()
            .map(|(_, notify)| Arc::clone(notify))
            .collect();
        for notify in watchers {
            notify();
        }
    }
}

impl<T> Clone for Cell<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            version: Arc::clone(&self.version),
            watchers: Arc::clone(&self.watchers),
        }
    }
}

impl<T> Debug for Cell<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("value", &self.get())
            .field("version", &self.version())
            .field("watcher_count", &self.watcher_count())
            .finish()
    }
}
