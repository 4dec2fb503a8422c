//! Viewport intersection state.
//!
//! Wraps the host's intersection observation primitive in two forms: one
//! observer per element (the simple, recommended shape) and one observer
//! shared across a list of elements with positional index correspondence.
//!
//! The index of an entry in the array form matches the position of its
//! element in the observed target list. Positions are not stable against
//! removal or reordering of targets; callers that mutate the list reconnect
//! with a fresh list.

use std::sync::{Arc, Mutex};

use crate::dom::ElementId;
use crate::reactive::{Cell, EffectScope, Teardown, WatcherId};

/// Options forwarded to the observation primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Ancestor element whose bounds act as the viewport; `None` observes
    /// against the real viewport.
    pub root: Option<ElementId>,
    /// Margin offsets applied to the root bounds, CSS-margin syntax.
    pub root_margin: String,
    /// Intersection ratios at which entries are delivered.
    pub threshold: Vec<f64>,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root: None,
            root_margin: "0px 0px 0px 0px".to_string(),
            threshold: vec![1.0],
        }
    }
}

/// One observation report for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    pub is_intersecting: bool,
    pub ratio: f64,
}

/// Callback receiving every delivery of changed entries.
pub type EntrySink = Arc<dyn Fn(&[IntersectionEntry]) + Send + Sync>;

/// The injected viewport-intersection primitive.
///
/// A connection observes a fixed set of targets; the returned teardown
/// disconnects it. Only entries that changed are delivered per tick.
pub trait IntersectionSource: Send + Sync + 'static {
    fn connect(
        &self,
        targets: &[ElementId],
        options: &ObserverOptions,
        sink: EntrySink,
    ) -> Teardown;
}

/// Single-element intersection state: holds the last entry delivered for
/// the observed element.
pub struct IntersectionState {
    source: Arc<dyn IntersectionSource>,
    entry: Cell<Option<IntersectionEntry>>,
    scope: Mutex<EffectScope<(ElementId, ObserverOptions)>>,
}

impl IntersectionState {
    pub fn new(source: Arc<dyn IntersectionSource>) -> Self {
        Self {
            source,
            entry: Cell::new(None),
            scope: Mutex::new(EffectScope::new()),
        }
    }

    /// Observe `target`. Reconnects if the target or options changed; no-op
    /// otherwise.
    pub fn observe(&self, target: ElementId, options: ObserverOptions) {
        let source = Arc::clone(&self.source);
        let entry = self.entry.clone();
        self.scope
            .lock()
            .expect("scope lock poisoned")
            .run((target, options.clone()), move |activation| {
                source.connect(
                    &[target],
                    &options,
                    Arc::new(move |entries| {
                        if !activation.is_live() {
                            return;
                        }
                        if let Some(first) = entries.first() {
                            entry.set(Some(first.clone()));
                        }
                    }),
                )
            });
    }

    /// The last entry delivered, `None` before the first delivery.
    pub fn entry(&self) -> Option<IntersectionEntry> {
        self.entry.get()
    }

    pub fn watch<F>(&self, notify: F) -> WatcherId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.entry.watch(notify)
    }

    pub fn unwatch(&self, id: WatcherId) {
        self.entry.unwatch(id);
    }

    /// Disconnect the observer.
    pub fn dispose(&self) {
        self.scope.lock().expect("scope lock poisoned").dispose();
    }
}

impl Drop for IntersectionState {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Multi-element intersection state sharing one observer connection.
pub struct IntersectionArrayState {
    source: Arc<dyn IntersectionSource>,
    entries: Cell<Vec<Option<IntersectionEntry>>>,
    /// Merge sparse deliveries into the prior array (true) or reset
    /// undelivered slots each tick (false).
    always_show_last: bool,
    scope: Mutex<EffectScope<(Vec<ElementId>, ObserverOptions)>>,
}

impl IntersectionArrayState {
    pub fn new(source: Arc<dyn IntersectionSource>, always_show_last: bool) -> Self {
        Self {
            source,
            entries: Cell::new(Vec::new()),
            always_show_last,
            scope: Mutex::new(EffectScope::new()),
        }
    }

    /// Observe `targets` through one shared connection. Entry index i
    /// corresponds to `targets[i]`.
    pub fn observe(&self, targets: Vec<ElementId>, options: ObserverOptions) {
        let source = Arc::clone(&self.source);
        let entries = self.entries.clone();
        let always_show_last = self.always_show_last;
        self.scope
            .lock()
            .expect("scope lock poisoned")
            .run((targets.clone(), options.clone()), move |activation| {
                let sink_targets = targets.clone();
                source.connect(
                    &targets,
                    &options,
                    Arc::new(move |delivered| {
                        if !activation.is_live() {
                            return;
                        }
                        apply_delivery(&entries, &sink_targets, always_show_last, delivered);
                    }),
                )
            });
    }

    /// The last known entry per target index. Empty before the first
    /// delivery.
    pub fn entries(&self) -> Vec<Option<IntersectionEntry>> {
        self.entries.get()
    }

    pub fn watch<F>(&self, notify: F) -> WatcherId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.entries.watch(notify)
    }

    pub fn unwatch(&self, id: WatcherId) {
        self.entries.unwatch(id);
    }

    /// Disconnect the observer.
    pub fn dispose(&self) {
        self.scope.lock().expect("scope lock poisoned").dispose();
    }
}

impl Drop for IntersectionArrayState {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn apply_delivery(
    cell: &Cell<Vec<Option<IntersectionEntry>>>,
    targets: &[ElementId],
    always_show_last: bool,
    delivered: &[IntersectionEntry],
) {
    cell.update(|current| {
        let mut next = if current.is_empty() || !always_show_last {
            vec![None; targets.len()]
        } else {
            // A reconnect may have changed the target list since the prior
            // delivery; indices are relative to the current list.
            let mut prior = current.clone();
            prior.resize(targets.len(), None);
            prior
        };
        for entry in delivered {
            if let Some(index) = targets.iter().position(|t| *t == entry.target) {
                next[index] = Some(entry.clone());
            }
        }
        *current = next;
    });
}
