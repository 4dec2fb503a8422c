//! Small utilities composed from the reactive core.
//!
//! Each of these wraps one or two primitives from [`reactive`](crate::reactive)
//! or [`dom`](crate::dom) into a ready-made state holder: a debounced value,
//! a rate-limited setter, lifecycle flags, and event binding helpers.

mod cooldown;
mod debounce;
mod events;
mod flags;
mod toggle;

pub use cooldown::CooldownState;
pub use debounce::Debounced;
pub use events::{ClickOutside, ClickOutsideOptions, EventBinder};
pub use flags::{FirstEvaluation, Mounted};
pub use toggle::Toggle;
