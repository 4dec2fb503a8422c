//! Lifecycle flags.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::reactive::{Cell, WatcherId};

/// True exactly once, on the very first check.
///
/// Distinguishes an instance's first evaluation from every later one.
#[derive(Debug)]
pub struct FirstEvaluation {
    fresh: AtomicBool,
}

impl FirstEvaluation {
    pub fn new() -> Self {
        Self {
            fresh: AtomicBool::new(true),
        }
    }

    /// Returns true on the first call, false on every call after.
    pub fn check(&self) -> bool {
        self.fresh.swap(false, Ordering::SeqCst)
    }
}

impl Default for FirstEvaluation {
    fn default() -> Self {
        Self::new()
    }
}

/// False until activation has run at least once, true thereafter.
///
/// Lets callers render a pre-activation default that matches server-side
/// prerendered output, then switch once the client is live.
pub struct Mounted {
    mounted: Cell<bool>,
}

impl Mounted {
    pub fn new() -> Self {
        Self {
            mounted: Cell::new(false),
        }
    }

    pub fn has_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn mark_mounted(&self) {
        self.mounted.set(true);
    }

    pub fn mark_unmounted(&self) {
        self.mounted.set(false);
    }

    pub fn watch<F>(&self, notify: F) -> WatcherId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.mounted.watch(notify)
    }

    pub fn unwatch(&self, id: WatcherId) {
        self.mounted.unwatch(id);
    }
}

impl Default for Mounted {
    fn default() -> Self {
        Self::new()
    }
}
