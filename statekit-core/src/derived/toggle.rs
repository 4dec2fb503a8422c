//! Boolean toggle.

use crate::reactive::{Cell, WatcherId};

/// A boolean flag with a flip action. Nothing is persisted.
pub struct Toggle {
    value: Cell<bool>,
}

impl Toggle {
    pub fn new(initial: bool) -> Self {
        Self {
            value: Cell::new(initial),
        }
    }

    pub fn get(&self) -> bool {
        self.value.get()
    }

    pub fn toggle(&self) {
        self.value.update(|v| *v = !*v);
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
}

impl Default for Toggle {
    fn default() -> Self {
        Self::new(false)
    }
}
