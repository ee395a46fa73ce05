//! Shared types for the easel scene editor.
//!
//! # Invariants
//! - `EntityId`s are never reused within a store, so a stale id never aliases a live entity.
//! - `Transform::world_matrix` is a pure function of the transform fields.

mod error;
mod types;

pub use error::SceneError;
pub use types::{EntityId, EntityUuid, Transform};
