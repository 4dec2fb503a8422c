//! Statekit Core
//!
//! This crate provides the state utilities for the Statekit reactive UI
//! toolkit. It implements:
//!
//! - Reactive primitives (cells, effect scopes, activation tokens)
//! - A network fetch utility with retry and stale-response discarding
//! - A paginated loader with truncation and error-continuation policy
//! - Storage-backed state with cross-instance change propagation
//! - Observer-backed state (viewport intersection, preferred color scheme)
//! - Small derived utilities (debounce, cooldown, toggle, event binding)
//!
//! Every utility follows one convention: it owns a [`reactive::Cell`],
//! subscribes to an external source on activation, updates the cell when the
//! source fires, and tears the subscription down deterministically when its
//! inputs change or the instance is disposed. Platform pieces (transport,
//! storage, observers, event targets) are injected as traits so every
//! utility runs against fakes in tests.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Cells, effect scopes, and activation tokens
//! - `dom`: The injected event-target surface
//! - `fetch`: The network fetch utility and its transport trait
//! - `lazy`: The paginated loader
//! - `storage`: Storage-backed state and the change bus
//! - `observe`: Intersection and color-scheme observers, dark mode
//! - `derived`: Debounce, cooldown, toggle, flags, event binders
//!
//! # Example
//!
//! ```rust,ignore
//! use statekit_core::reactive::Cell;
//! use statekit_core::derived::Toggle;
//!
//! // Create a cell and watch it for changes.
//! let name = Cell::new(String::from("world"));
//! name.watch(|| println!("name changed"));
//!
//! // Update the value; the watcher fires.
//! name.set(String::from("statekit"));
//!
//! // Derived utilities wrap cells into ready-made state holders.
//! let dark = Toggle::new(false);
//! dark.toggle();
//! assert!(dark.get());
//! ```

pub mod derived;
pub mod dom;
pub mod fetch;
pub mod lazy;
pub mod observe;
pub mod reactive;
pub mod storage;
