//! Host-environment observers.
//!
//! State holders in this module mirror facts the host environment owns
//! into [`Cell`](crate::reactive::Cell)s: element visibility through an
//! [`IntersectionSource`] and the preferred color scheme through a
//! [`SchemeSource`]. Both primitives are injected as traits so the state
//! holders stay host-agnostic and testable.

mod intersection;
mod scheme;
mod theme;

pub use intersection::{
    EntrySink, IntersectionArrayState, IntersectionEntry, IntersectionSource, IntersectionState,
    ObserverOptions,
};
pub use scheme::{PreferredScheme, Scheme, SchemeSink, SchemeSource};
pub use theme::{DarkMode, DarkModeOptions, DARK_MODE_KEY};
