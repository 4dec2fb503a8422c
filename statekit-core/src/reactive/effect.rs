//! Effect Subscription
//!
//! An effect subscription is a scoped acquisition of an external resource
//! (listener, timer, observer) performed on activation, with guaranteed
//! teardown on deactivation or dependency change.
//!
//! # How Effect Scopes Work
//!
//! 1. `run(deps, activate)` compares `deps` with the value from the previous
//!    call. If they are equal, nothing happens.
//!
//! 2. If they differ (or this is the first call), the previous activation is
//!    revoked, its teardown runs, and `activate` is invoked with a fresh
//!    [`Activation`] token. `activate` returns the teardown for the new
//!    subscription.
//!
//! 3. `dispose()` (also run on drop) revokes and tears down the current
//!    activation.
//!
//! # Cancellation
//!
//! The [`Activation`] token is the per-activation cancellation flag for
//! asynchronous continuations: clone it into every handler and timer
//! callback, and check `is_live()` before mutating state. Once teardown has
//! started, the token reports dead, so events from a superseded subscription
//! can never leak into current state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cleanup action returned by an activation, run exactly once.
pub type Teardown = Box<dyn FnOnce() + Send>;

/// Per-activation cancellation token.
///
/// Handed to the activation closure and cloned into any handler or
/// asynchronous continuation it spawns. Revoked before the activation's
/// teardown runs.
#[derive(Clone)]
pub struct Activation {
    live: Arc<AtomicBool>,
}

impl Activation {
    pub(crate) fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Whether this activation is still current.
    ///
    /// Returns false from the moment the activation is superseded or its
    /// scope is disposed. Continuations must check this before every state
    /// mutation.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn revoke(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

struct Active {
    activation: Activation,
    teardown: Option<Teardown>,
}

/// A dependency-keyed subscription slot.
///
/// Holds at most one live activation at a time. Re-running with changed
/// dependencies tears the old activation down before the new one starts.
///
/// # Example
///
/// ```rust,ignore
/// let mut scope = EffectScope::new();
///
/// scope.run(url.clone(), |activation| {
///     let handle = source.subscribe(move |event| {
///         if activation.is_live() {
///             apply(event);
///         }
///     });
///     Box::new(move || handle.cancel())
/// });
/// ```
pub struct EffectScope<D>
where
    D: PartialEq,
{
    deps: Option<D>,
    active: Option<Active>,
}

impl<D> EffectScope<D>
where
    D: PartialEq,
{
    /// Create an empty scope. Nothing is subscribed until the first `run`.
    pub fn new() -> Self {
        Self {
            deps: None,
            active: None,
        }
    }

    /// Activate the subscription for `deps`, tearing down the previous one
    /// first if `deps` changed.
    ///
    /// `activate` receives the activation token and returns the teardown for
    /// the resources it acquired.
    pub fn run<F>(&mut self, deps: D, activate: F)
    where
        F: FnOnce(Activation) -> Teardown,
    {
        if self.active.is_some() && self.deps.as_ref() == Some(&deps) {
            return;
        }

        self.deactivate();

        let activation = Activation::new();
        let teardown = activate(activation.clone());
        self.deps = Some(deps);
        self.active = Some(Active {
            activation,
            teardown: Some(teardown),
        });
    }

    /// Whether the scope currently holds a live activation.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Revoke and tear down the current activation, if any.
    pub fn dispose(&mut self) {
        self.deactivate();
        self.deps = None;
    }

    fn deactivate(&mut self) {
        if let Some(mut active) = self.active.take() {
            // Revoke before teardown so handlers firing mid-teardown are no-ops.
            active.activation.revoke();
            if let Some(teardown) = active.teardown.take() {
                teardown();
            }
        }
    }
}

impl<D> Default for EffectScope<D>
where
    D: PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Drop for EffectScope<D>
where
    D: PartialEq,
{
    fn drop(&mut self) {
        self.deactivate();
    }
}
