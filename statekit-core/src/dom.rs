//! Injected browser-platform surface.
//!
//! The utilities in this crate never talk to a real DOM. Hosts inject small
//! trait objects modeling the platform pieces a utility needs: an event
//! target that can be listened to, an element identity, and the event record
//! delivered to listeners. Tests drive the same traits with fakes.

use std::sync::Arc;

use crate::reactive::Teardown;

/// Opaque identity of a host-side element.
///
/// The crate never inspects elements; it only compares identities and checks
/// membership in event propagation paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// An event delivered by an [`EventTarget`].
///
/// `path` is the propagation path from the innermost element outward, the
/// way the platform reports it. `target` is the innermost element, if any.
#[derive(Debug, Clone)]
pub struct UiEvent {
    pub event_type: String,
    pub target: Option<ElementId>,
    pub path: Vec<ElementId>,
}

impl UiEvent {
    pub fn new(event_type: impl Into<String>, target: ElementId) -> Self {
        Self {
            event_type: event_type.into(),
            target: Some(target),
            path: vec![target],
        }
    }

    /// Attach the full propagation path (innermost first).
    pub fn with_path(mut self, path: Vec<ElementId>) -> Self {
        self.path = path;
        self
    }
}

/// Callback invoked by an event target for every matching event.
pub type EventSink = Arc<dyn Fn(&UiEvent) + Send + Sync>;

/// Something that can be listened to: an element, the document, the window.
///
/// `add_listener` returns the teardown that removes the listener again. A
/// listener removed by its teardown must never fire afterwards.
pub trait EventTarget: Send + Sync {
    fn add_listener(&self, event_type: &str, sink: EventSink) -> Teardown;
}

#[cfg(test)]
pub(crate) mod fake {
    //! A scriptable event target used across the crate's tests.

    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::RwLock;

    #[derive(Default)]
    pub struct FakeTarget {
        next_id: AtomicU64,
        listeners: Arc<RwLock<Vec<(u64, String, EventSink)>>>,
    }

    impl FakeTarget {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Deliver an event to every listener registered for its type.
        pub fn emit(&self, event: &UiEvent) {
            let listeners = self.listeners.read().expect("listeners lock poisoned");
            for (_, event_type, sink) in listeners.iter() {
                if *event_type == event.event_type {
                    sink(event);
                }
            }
        }

        pub fn listener_count(&self) -> usize {
            self.listeners.read().expect("listeners lock poisoned").len()
        }
    }

    impl EventTarget for FakeTarget {
        fn add_listener(&self, event_type: &str, sink: EventSink) -> Teardown {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            self.listeners
                .write()
                .expect("listeners lock poisoned")
                .push((id, event_type.to_string(), sink));

            let listeners = Arc::clone(&self.listeners);
            Box::new(move || {
                listeners
                    .write()
                    .expect("listeners lock poisoned")
                    .retain(|(listener, _, _)| *listener != id);
            })
        }
    }

    #[test]
    fn fake_target_removes_listeners_on_teardown() {
        let target = FakeTarget::new();
        let teardown = target.add_listener("click", Arc::new(|_| {}));
        assert_eq!(target.listener_count(), 1);

        teardown();
        assert_eq!(target.listener_count(), 0);
    }
}
