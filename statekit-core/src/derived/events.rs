//! Event binding utilities.
//!
//! [`EventBinder`] attaches one listener to one retargetable event target.
//! [`ClickOutside`] listens on an injected global target and invokes its
//! callback only for events originating outside a bound element.

use std::sync::{Arc, Mutex};

use crate::dom::{ElementId, EventSink, EventTarget, UiEvent};
use crate::reactive::EffectScope;

/// Binds a listener to whichever target is currently set.
///
/// Rebinding to a new target tears down the previous binding first;
/// `set_target(None)` just unbinds. The binding is keyed by target identity,
/// so setting the same target twice is a no-op.
pub struct EventBinder {
    event_type: String,
    listener: EventSink,
    scope: Mutex<EffectScope<Option<usize>>>,
}

impl EventBinder {
    pub fn new(event_type: impl Into<String>, listener: EventSink) -> Self {
        Self {
            event_type: event_type.into(),
            listener,
            scope: Mutex::new(EffectScope::new()),
        }
    }

    /// Bind the listener to `target`, or unbind with `None`.
    pub fn set_target(&self, target: Option<Arc<dyn EventTarget>>) {
        let key = target
            .as_ref()
            .map(|t| Arc::as_ptr(t) as *const () as usize);
        let event_type = self.event_type.clone();
        let listener = Arc::clone(&self.listener);
        self.scope
            .lock()
            .expect("scope lock poisoned")
            .run(key, move |activation| match target {
                Some(target) => {
                    let sink: EventSink = Arc::new(move |event| {
                        if activation.is_live() {
                            listener(event);
                        }
                    });
                    target.add_listener(&event_type, sink)
                }
                None => Box::new(|| {}),
            });
    }

    /// Tear down the current binding.
    pub fn dispose(&self) {
        self.scope.lock().expect("scope lock poisoned").dispose();
    }
}

impl Drop for EventBinder {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutsideOptions {
    /// Event type to listen for. Defaults to "click".
    pub event_type: String,
    /// Treat events on the element's descendants as inside. Defaults to
    /// true.
    pub include_children: bool,
}

impl Default for ClickOutsideOptions {
    fn default() -> Self {
        Self {
            event_type: "click".to_string(),
            include_children: true,
        }
    }
}

/// Fires a callback for events on a global target that originate outside a
/// bound element.
pub struct ClickOutside {
    global: Arc<dyn EventTarget>,
    callback: EventSink,
    options: ClickOutsideOptions,
    scope: Mutex<EffectScope<(ElementId, ClickOutsideOptions)>>,
}

impl ClickOutside {
    pub fn new(
        global: Arc<dyn EventTarget>,
        callback: EventSink,
        options: ClickOutsideOptions,
    ) -> Self {
        Self {
            global,
            callback,
            options,
            scope: Mutex::new(EffectScope::new()),
        }
    }

    /// Bind to `element`: events targeting it (or, with `include_children`,
    /// anything on its propagation path) are ignored, everything else
    /// invokes the callback.
    pub fn attach(&self, element: ElementId) {
        let global = Arc::clone(&self.global);
        let callback = Arc::clone(&self.callback);
        let options = self.options.clone();
        self.scope
            .lock()
            .expect("scope lock poisoned")
            .run((element, options.clone()), move |activation| {
                let include_children = options.include_children;
                global.add_listener(
                    &options.event_type,
                    Arc::new(move |event| {
                        if !activation.is_live() {
                            return;
                        }
                        if is_inside(event, element, include_children) {
                            return;
                        }
                        callback(event);
                    }),
                )
            });
    }

    /// Stop listening.
    pub fn dispose(&self) {
        self.scope.lock().expect("scope lock poisoned").dispose();
    }
}

impl Drop for ClickOutside {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn is_inside(event: &UiEvent, element: ElementId, include_children: bool) -> bool {
    if event.target == Some(element) {
        return true;
    }
    include_children && event.path.contains(&element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fake::FakeTarget;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn counting_sink() -> (EventSink, Arc<AtomicI32>) {
        let count = Arc::new(AtomicI32::new(0));
        let seen = Arc::clone(&count);
        let sink: EventSink = Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (sink, count)
    }

    #[test]
    fn binder_attaches_and_rebinds() {
        let first = FakeTarget::new();
        let second = FakeTarget::new();
        let (sink, fired) = counting_sink();
        let binder = EventBinder::new("scroll", sink);

        binder.set_target(Some(first.clone() as Arc<dyn EventTarget>));
        first.emit(&UiEvent::new("scroll", ElementId(1)));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        binder.set_target(Some(second.clone() as Arc<dyn EventTarget>));
        assert_eq!(first.listener_count(), 0);

        first.emit(&UiEvent::new("scroll", ElementId(1)));
        second.emit(&UiEvent::new("scroll", ElementId(1)));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn binder_unbinds_on_none() {
        let target = FakeTarget::new();
        let (sink, fired) = counting_sink();
        let binder = EventBinder::new("click", sink);

        binder.set_target(Some(target.clone() as Arc<dyn EventTarget>));
        binder.set_target(None);
        assert_eq!(target.listener_count(), 0);

        target.emit(&UiEvent::new("click", ElementId(1)));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn binder_same_target_is_a_noop() {
        let target = FakeTarget::new();
        let (sink, _) = counting_sink();
        let binder = EventBinder::new("click", sink);

        let shared: Arc<dyn EventTarget> = target.clone();
        binder.set_target(Some(Arc::clone(&shared)));
        binder.set_target(Some(shared));
        assert_eq!(target.listener_count(), 1);
    }

    #[test]
    fn click_outside_fires_only_for_outside_events() {
        let global = FakeTarget::new();
        let (sink, fired) = counting_sink();
        let detector = ClickOutside::new(global.clone(), sink, ClickOutsideOptions::default());
        let bound = ElementId(1);

        detector.attach(bound);

        global.emit(&UiEvent::new("click", bound));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        global.emit(&UiEvent::new("click", ElementId(9)));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn click_on_child_counts_as_inside_by_default() {
        let global = FakeTarget::new();
        let (sink, fired) = counting_sink();
        let detector = ClickOutside::new(global.clone(), sink, ClickOutsideOptions::default());
        let bound = ElementId(1);
        let child = ElementId(2);

        detector.attach(bound);

        // The bound element sits on the child's propagation path.
        global.emit(&UiEvent::new("click", child).with_path(vec![child, bound]));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn child_clicks_are_outside_when_children_excluded() {
        let global = FakeTarget::new();
        let (sink, fired) = counting_sink();
        let detector = ClickOutside::new(
            global.clone(),
            sink,
            ClickOutsideOptions {
                include_children: false,
                ..ClickOutsideOptions::default()
            },
        );
        let bound = ElementId(1);
        let child = ElementId(2);

        detector.attach(bound);

        global.emit(&UiEvent::new("click", child).with_path(vec![child, bound]));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        global.emit(&UiEvent::new("click", bound));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn other_event_types_are_ignored() {
        let global = FakeTarget::new();
        let (sink, fired) = counting_sink();
        let detector = ClickOutside::new(
            global.clone(),
            sink,
            ClickOutsideOptions {
                event_type: "pointerdown".to_string(),
                ..ClickOutsideOptions::default()
            },
        );

        detector.attach(ElementId(1));

        global.emit(&UiEvent::new("click", ElementId(9)));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        global.emit(&UiEvent::new("pointerdown", ElementId(9)));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disposed_detector_is_silent() {
        let global = FakeTarget::new();
        let (sink, fired) = counting_sink();
        let detector = ClickOutside::new(global.clone(), sink, ClickOutsideOptions::default());

        detector.attach(ElementId(1));
        detector.dispose();
        assert_eq!(global.listener_count(), 0);

        global.emit(&UiEvent::new("click", ElementId(9)));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
