//! Same-process change notification channel.
//!
//! Instances sharing a backend coordinate through this bus and nothing
//! else: a published event carries the key, the new value, and the origin
//! instance so receivers can skip their own echo. Writers are otherwise
//! last-writer-wins at the store level.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::reactive::InstanceId;

/// A change notification as carried by the bus.
#[derive(Debug, Clone)]
pub struct StorageEvent {
    pub key: String,
    /// The value after the change; `None` for a removal.
    pub new_value: Option<String>,
    /// The instance that performed the change.
    pub origin: InstanceId,
}

/// Handle for removing a bus listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

/// The broadcast channel shared by all stored-state instances of a host.
#[derive(Default)]
pub struct ChangeBus {
    listeners: DashMap<ListenerId, Listener>,
    next_id: AtomicU64,
}

impl ChangeBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a listener for every published event. Filtering by key and
    /// origin is the listener's job.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, Arc::new(listener));
        id
    }

    /// Remove a listener. After this call it is never invoked again.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    /// Deliver an event to every registered listener.
    pub fn publish(&self, event: &StorageEvent) {
        // Snapshot the listeners first so a callback can resubscribe without
        // deadlocking against the registry.
        let listeners: Vec<Listener> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
