//! Storage-Backed State Utility
//!
//! Mirrors a state cell to a persistent key/value store, optionally
//! broadcasting and receiving change notifications across independent
//! instances sharing a key.
//!
//! # Echo suppression
//!
//! Every instance carries a stable identity token and tags its broadcasts
//! with it. A received notification is applied only when listening is
//! enabled, the key matches, and the origin differs from the receiving
//! instance, so an instance never double-applies its own change.
//!
//! # Deferred reads
//!
//! In deferred mode (the default) the value reads `None` until `hydrate`
//! performs the first real store read. This keeps a pre-rendered value and
//! the first client-side value identical when the store only exists in the
//! client runtime.

mod backend;
mod bus;

pub use backend::{MemoryStorage, StorageBackend};
pub use bus::{ChangeBus, ListenerId, StorageEvent};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::reactive::{Cell, EffectScope, InstanceId, WatcherId};

/// Configuration for a stored-state instance.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Seeded into the store when the key has no value yet.
    pub initial_value: Option<String>,
    /// Broadcast own changes on the bus. Defaults to false.
    pub propagate_changes: bool,
    /// Apply matching changes observed on the bus. Defaults to false.
    pub listen_for_changes: bool,
    /// Hold off the first store read until `hydrate`. Defaults to true.
    pub deferred: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            initial_value: None,
            propagate_changes: false,
            listen_for_changes: false,
            deferred: true,
        }
    }
}

/// A state cell mirrored to a persistent key/value store.
pub struct StoredState {
    id: InstanceId,
    backend: Arc<dyn StorageBackend>,
    bus: Arc<ChangeBus>,
    options: StorageOptions,
    key: RwLock<String>,
    value: Cell<Option<String>>,
    hydrated: AtomicBool,
    listener: Mutex<EffectScope<String>>,
}

impl StoredState {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        bus: Arc<ChangeBus>,
        key: impl Into<String>,
        options: StorageOptions,
    ) -> Self {
        let key = key.into();
        let hydrated = !options.deferred;
        let initial = if hydrated {
            read_or_seed(backend.as_ref(), &options, &key)
        } else {
            None
        };

        let state = Self {
            id: InstanceId::new(),
            backend,
            bus,
            options,
            key: RwLock::new(key.clone()),
            value: Cell::new(initial),
            hydrated: AtomicBool::new(hydrated),
            listener: Mutex::new(EffectScope::new()),
        };

        if state.options.listen_for_changes {
            state.attach_listener(key);
        }

        state
    }

    /// The stable identity token of this instance.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The current value, `None` before hydration or when the key is unset.
    pub fn value(&self) -> Option<String> {
        self.value.get()
    }

    /// Register a re-render trigger fired on every value change.
    pub fn watch<F>(&self, notify: F) -> WatcherId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.value.watch(notify)
    }

    pub fn unwatch(&self, id: WatcherId) {
        self.value.unwatch(id);
    }

    /// Perform the first real store read in deferred mode. Safe to call
    /// again; later calls simply re-read the store.
    pub fn hydrate(&self) {
        self.hydrated.store(true, Ordering::SeqCst);
        let key = self.key.read().expect("key lock poisoned").clone();
        let value = read_or_seed(self.backend.as_ref(), &self.options, &key);
        self.value.set(value);
    }

    /// Write through to the store (`None` removes the key) and, when
    /// propagation is enabled, broadcast the change tagged with this
    /// instance's identity.
    pub fn set_value(&self, value: Option<String>) {
        let key = self.key.read().expect("key lock poisoned").clone();
        match &value {
            Some(v) => self.backend.set(&key, v),
            None => self.backend.remove(&key),
        }
        self.value.set(value.clone());

        if self.options.propagate_changes {
            self.bus.publish(&StorageEvent {
                key,
                new_value: value,
                origin: self.id,
            });
        }
    }

    /// Switch the observed key: tears down the old bus listener, establishes
    /// one for the new key, and re-reads the store.
    pub fn set_key(&self, key: impl Into<String>) {
        let key = key.into();
        *self.key.write().expect("key lock poisoned") = key.clone();

        if self.hydrated.load(Ordering::SeqCst) {
            let value = read_or_seed(self.backend.as_ref(), &self.options, &key);
            self.value.set(value);
        }

        if self.options.listen_for_changes {
            self.attach_listener(key);
        }
    }

    /// Deactivate: stop observing the bus. The value cell keeps its last
    /// state but no further external changes are applied.
    pub fn dispose(&self) {
        self.listener
            .lock()
            .expect("listener lock poisoned")
            .dispose();
    }

    fn attach_listener(&self, key: String) {
        let bus = Arc::clone(&self.bus);
        let unsubscribe_bus = Arc::clone(&self.bus);
        let cell = self.value.clone();
        let own_id = self.id;

        self.listener
            .lock()
            .expect("listener lock poisoned")
            .run(key.clone(), move |activation| {
                let listener_id = bus.subscribe(move |event| {
                    if !activation.is_live() || event.key != key {
                        return;
                    }
                    if event.origin == own_id {
                        tracing::trace!(key = %event.key, "suppressing change echo");
                        return;
                    }
                    cell.set(event.new_value.clone());
                });
                Box::new(move || unsubscribe_bus.unsubscribe(listener_id))
            });
    }
}

impl Drop for StoredState {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn read_or_seed(
    backend: &dyn StorageBackend,
    options: &StorageOptions,
    key: &str,
) -> Option<String> {
    if let Some(value) = backend.get(key) {
        return Some(value);
    }
    if let Some(initial) = &options.initial_value {
        backend.set(key, initial);
        return Some(initial.clone());
    }
    None
}
