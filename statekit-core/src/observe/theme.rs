//! Dark mode state.
//!
//! Combines the host's preferred scheme with a persisted user choice. The
//! resolved theme follows a fixed precedence: a value persisted in storage
//! wins over the configured default, which wins over the host's preferred
//! scheme. Explicit choices made through [`DarkMode::set_theme`] and
//! [`DarkMode::toggle_theme`] persist (unless persistence is disabled);
//! changes that merely follow the host scheme do not.

use std::sync::{Arc, Mutex};

use crate::observe::scheme::{Scheme, SchemeSource};
use crate::reactive::{Cell, EffectScope, WatcherId};
use crate::storage::{ChangeBus, StorageBackend, StorageOptions, StoredState};

/// Storage key holding the persisted theme choice.
pub const DARK_MODE_KEY: &str = "statekit-dark-mode";

#[derive(Debug, Clone)]
pub struct DarkModeOptions {
    /// Theme used when storage holds no choice. `None` falls through to
    /// the host's preferred scheme.
    pub default_theme: Option<Scheme>,
    /// Follow host scheme changes. Defaults to true.
    pub update_on_scheme_change: bool,
    /// Persist explicit theme choices. Defaults to true.
    pub persist: bool,
    /// Hold off resolution until `hydrate`. Defaults to true.
    pub deferred: bool,
}

impl Default for DarkModeOptions {
    fn default() -> Self {
        Self {
            default_theme: None,
            update_on_scheme_change: true,
            persist: true,
            deferred: true,
        }
    }
}

/// Resolved dark/light theme with optional persistence.
pub struct DarkMode {
    theme: Cell<Option<Scheme>>,
    stored: StoredState,
    source: Arc<dyn SchemeSource>,
    options: DarkModeOptions,
    scope: Mutex<EffectScope<()>>,
}

impl DarkMode {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        bus: Arc<ChangeBus>,
        source: Arc<dyn SchemeSource>,
        options: DarkModeOptions,
    ) -> Self {
        let stored = StoredState::new(
            backend,
            bus,
            DARK_MODE_KEY,
            StorageOptions {
                deferred: options.deferred,
                ..StorageOptions::default()
            },
        );
        let state = Self {
            theme: Cell::new(None),
            stored,
            source,
            options,
            scope: Mutex::new(EffectScope::new()),
        };
        if !state.options.deferred {
            state.resolve();
        }
        if state.options.update_on_scheme_change {
            state.attach();
        }
        state
    }

    /// Precedence: persisted choice, then configured default, then the
    /// host's preferred scheme.
    fn resolve(&self) {
        let resolved = self
            .stored
            .value()
            .and_then(|v| Scheme::parse(&v))
            .or(self.options.default_theme)
            .unwrap_or_else(|| self.source.current());
        self.theme.set(Some(resolved));
    }

    fn attach(&self) {
        let source = Arc::clone(&self.source);
        let theme = self.theme.clone();
        self.scope
            .lock()
            .expect("scope lock poisoned")
            .run((), move |activation| {
                source.subscribe(Arc::new(move |next| {
                    if activation.is_live() {
                        theme.set(Some(next));
                    }
                }))
            });
    }

    /// Read storage and resolve the theme. Call once the client is mounted
    /// when constructed deferred.
    pub fn hydrate(&self) {
        self.stored.hydrate();
        self.resolve();
    }

    /// The resolved theme, `None` while deferred and not yet hydrated.
    pub fn theme(&self) -> Option<Scheme> {
        self.theme.get()
    }

    pub fn is_dark(&self) -> bool {
        self.theme() == Some(Scheme::Dark)
    }

    /// Set the theme explicitly, persisting the choice when enabled.
    pub fn set_theme(&self, scheme: Scheme) {
        self.theme.set(Some(scheme));
        if self.options.persist {
            self.stored.set_value(Some(scheme.as_str().to_string()));
        }
    }

    /// Flip the theme. Anything other than an explicit light resolves to
    /// light, so an unresolved theme toggles to light.
    pub fn toggle_theme(&self) {
        let next = match self.theme() {
            Some(Scheme::Light) => Scheme::Dark,
            _ => Scheme::Light,
        };
        self.set_theme(next);
    }

    pub fn watch<F>(&self, notify: F) -> WatcherId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.theme.watch(notify)
    }

    pub fn unwatch(&self, id: WatcherId) {
        self.theme.unwatch(id);
    }

    /// Unsubscribe from scheme changes and the storage bus.
    pub fn dispose(&self) {
        self.scope.lock().expect("scope lock poisoned").dispose();
        self.stored.dispose();
    }
}

impl Drop for DarkMode {
    fn drop(&mut self) {
        self.dispose();
    }
}
