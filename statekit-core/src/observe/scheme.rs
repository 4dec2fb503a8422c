//! Preferred color scheme.
//!
//! Mirrors the host's preferred scheme (light or dark) into a [`Cell`],
//! tracking changes through an injected [`SchemeSource`]. The state can be
//! constructed deferred: it then reads `None` until [`PreferredScheme::hydrate`]
//! runs, which keeps server-rendered and client-rendered reads consistent.

use std::sync::{Arc, Mutex};

use crate::reactive::{Cell, EffectScope, Teardown, WatcherId};

/// A color scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Light,
    Dark,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Light => "light",
            Scheme::Dark => "dark",
        }
    }

    /// Parse a stored scheme string. Unknown strings yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Scheme::Light),
            "dark" => Some(Scheme::Dark),
            _ => None,
        }
    }
}

/// Callback invoked with each new preferred scheme.
pub type SchemeSink = Arc<dyn Fn(Scheme) + Send + Sync>;

/// The injected scheme primitive: a current value plus change notifications.
pub trait SchemeSource: Send + Sync + 'static {
    fn current(&self) -> Scheme;
    fn subscribe(&self, sink: SchemeSink) -> Teardown;
}

/// Reactive view of the host's preferred scheme.
pub struct PreferredScheme {
    source: Arc<dyn SchemeSource>,
    scheme: Cell<Option<Scheme>>,
    scope: Mutex<EffectScope<()>>,
}

impl PreferredScheme {
    /// Build the state and subscribe for changes. When `deferred` is true
    /// the current scheme is not read until [`hydrate`](Self::hydrate).
    pub fn new(source: Arc<dyn SchemeSource>, deferred: bool) -> Self {
        let initial = if deferred { None } else { Some(source.current()) };
        let state = Self {
            source,
            scheme: Cell::new(initial),
            scope: Mutex::new(EffectScope::new()),
        };
        state.attach();
        state
    }

    fn attach(&self) {
        let source = Arc::clone(&self.source);
        let scheme = self.scheme.clone();
        self.scope
            .lock()
            .expect("scope lock poisoned")
            .run((), move |activation| {
                source.subscribe(Arc::new(move |next| {
                    if activation.is_live() {
                        scheme.set(Some(next));
                    }
                }))
            });
    }

    /// Read the current scheme from the source. Call once the client is
    /// mounted when constructed deferred.
    pub fn hydrate(&self) {
        self.scheme.set(Some(self.source.current()));
    }

    /// The mirrored scheme, `None` while deferred and not yet hydrated.
    pub fn scheme(&self) -> Option<Scheme> {
        self.scheme.get()
    }

    pub fn watch<F>(&self, notify: F) -> WatcherId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.scheme.watch(notify)
    }

    pub fn unwatch(&self, id: WatcherId) {
        self.scheme.unwatch(id);
    }

    /// Unsubscribe from the source.
    pub fn dispose(&self) {
        self.scope.lock().expect("scope lock poisoned").dispose();
    }
}

impl Drop for PreferredScheme {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::RwLock;

    /// Scriptable scheme primitive with a settable current value.
    pub(crate) struct FakeSchemeSource {
        current: RwLock<Scheme>,
        sinks: Arc<RwLock<Vec<(u64, SchemeSink)>>>,
        next_id: AtomicU64,
    }

    impl FakeSchemeSource {
        pub(crate) fn new(initial: Scheme) -> Arc<Self> {
            Arc::new(Self {
                current: RwLock::new(initial),
                sinks: Arc::new(RwLock::new(Vec::new())),
                next_id: AtomicU64::new(0),
            })
        }

        /// Change the preferred scheme and notify subscribers.
        pub(crate) fn switch_to(&self, scheme: Scheme) {
            *self.current.write().expect("current lock poisoned") = scheme;
            let sinks: Vec<SchemeSink> = self
                .sinks
                .read()
                .expect("sinks lock poisoned")
                .iter()
                .map(|(_, sink)| Arc::clone(sink))
                .collect();
            for sink in sinks {
                sink(scheme);
            }
        }

        pub(crate) fn subscriber_count(&self) -> usize {
            self.sinks.read().expect("sinks lock poisoned").len()
        }
    }

    impl SchemeSource for FakeSchemeSource {
        fn current(&self) -> Scheme {
            *self.current.read().expect("current lock poisoned")
        }

        fn subscribe(&self, sink: SchemeSink) -> Teardown {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            self.sinks
                .write()
                .expect("sinks lock poisoned")
                .push((id, sink));

            let sinks = Arc::clone(&self.sinks);
            Box::new(move || {
                sinks
                    .write()
                    .expect("sinks lock poisoned")
                    .retain(|(sink_id, _)| *sink_id != id);
            })
        }
    }

    #[test]
    fn immediate_reads_current_scheme() {
        let source = FakeSchemeSource::new(Scheme::Dark);
        let preferred = PreferredScheme::new(source, false);
        assert_eq!(preferred.scheme(), Some(Scheme::Dark));
    }

    #[test]
    fn deferred_reads_none_until_hydrated() {
        let source = FakeSchemeSource::new(Scheme::Light);
        let preferred = PreferredScheme::new(source, true);
        assert_eq!(preferred.scheme(), None);

        preferred.hydrate();
        assert_eq!(preferred.scheme(), Some(Scheme::Light));
    }

    #[test]
    fn tracks_scheme_changes() {
        let source = FakeSchemeSource::new(Scheme::Light);
        let preferred = PreferredScheme::new(source.clone(), false);

        source.switch_to(Scheme::Dark);
        assert_eq!(preferred.scheme(), Some(Scheme::Dark));

        source.switch_to(Scheme::Light);
        assert_eq!(preferred.scheme(), Some(Scheme::Light));
    }

    #[test]
    fn deferred_still_tracks_changes_before_hydrate() {
        let source = FakeSchemeSource::new(Scheme::Light);
        let preferred = PreferredScheme::new(source.clone(), true);

        source.switch_to(Scheme::Dark);
        assert_eq!(preferred.scheme(), Some(Scheme::Dark));
    }

    #[test]
    fn dispose_unsubscribes() {
        let source = FakeSchemeSource::new(Scheme::Light);
        let preferred = PreferredScheme::new(source.clone(), false);
        assert_eq!(source.subscriber_count(), 1);

        preferred.dispose();
        assert_eq!(source.subscriber_count(), 0);

        source.switch_to(Scheme::Dark);
        assert_eq!(preferred.scheme(), Some(Scheme::Light));
    }

    #[test]
    fn scheme_strings_round_trip() {
        assert_eq!(Scheme::parse(Scheme::Dark.as_str()), Some(Scheme::Dark));
        assert_eq!(Scheme::parse(Scheme::Light.as_str()), Some(Scheme::Light));
        assert_eq!(Scheme::parse("sepia"), None);
    }
}
