//! Reactive Primitives
//!
//! This module implements the shared state-and-subscription convention every
//! utility in this crate is built on: cells, watcher identity, and effect
//! subscriptions.
//!
//! # Concepts
//!
//! ## Cells
//!
//! A Cell is a container for a utility's local state plus the re-render
//! trigger of whoever consumes it. Writes bump a version counter and notify
//! all registered watchers. Cells are owned by the activating component
//! instance and mutated only through their own setters.
//!
//! ## Effect Subscriptions
//!
//! An EffectScope is a dependency-keyed slot holding at most one live
//! subscription to an external source (listener, timer, observer, network
//! request). When the dependencies change, the old subscription is torn down
//! before the new one is established; on disposal it is torn down for good.
//!
//! ## Activations
//!
//! Every activation of a scope carries an Activation token, the explicit
//! cancellation flag checked by asynchronous continuations before they touch
//! state. This replaces the stale-closure hazards of implicit lifetimes with
//! a check at every suspension point.

mod cell;
mod effect;
mod id;

pub use cell::Cell;
pub use effect::{Activation, EffectScope, Teardown};
pub use id::{InstanceId, WatcherId};
