//! Editor input: a tagged event variant, the held-input state derived from it,
//! and the shortcut table that turns events into editor actions.
//!
//! # Invariants
//! - Every subsystem consumes the same `InputEvent` stream; there is one dispatch path.
//! - Shortcuts map to `Action`s. Editor logic never matches raw keys.

pub mod action;
mod bindings;
mod event;

pub use action::Action;
pub use bindings::Bindings;
pub use event::{InputEvent, InputState, Key, Modifiers, MouseButton};
