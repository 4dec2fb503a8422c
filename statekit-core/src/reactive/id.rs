//! Identity tokens for the reactive system.
//!
//! Two kinds of identity exist in this crate: watchers (callbacks registered
//! on a cell, removed when the owning component goes away) and utility
//! instances (used by the storage change bus to tell an instance's own
//! broadcasts apart from everyone else's).

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a watcher registered on a [`Cell`](super::Cell).
///
/// Returned by `Cell::watch` and required by `Cell::unwatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

impl WatcherId {
    /// Generate a new unique watcher ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for WatcherId {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable identity of a utility instance.
///
/// An instance tags every change notification it broadcasts with its own ID
/// so that it can skip the echo when the notification comes back around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Generate a new unique instance ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}
