//! Input mapping: key bindings turned into level-triggered camera actions.
//!
//! # Invariants
//! - The camera sees actions, never key codes.
//! - A snapshot reflects keys held at sample time; there are no press/release events.

pub mod action;
pub mod bindings;
pub mod snapshot;

pub use action::CameraAction;
pub use bindings::KeyBindings;
pub use snapshot::InputSnapshot;
