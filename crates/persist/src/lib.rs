//! Scene persistence: a YAML document keyed by component type names.
//!
//! # Invariants
//! - Loading goes through the public store API, so post-attach fix-ups run
//!   and mesh ids are stamped with the new entity ids.
//! - Entity uuids survive a round trip; entity ids do not.
//! - f32 fields round-trip bit-exactly.

mod document;
mod error;
mod serializer;

pub use document::{EntityDocument, SceneDocument};
pub use error::PersistError;
pub use serializer::SceneSerializer;
