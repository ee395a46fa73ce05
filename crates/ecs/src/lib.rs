//! Deterministic entity-component store for the scene graph.
//!
//! Components are stored in one BTreeMap per component type, keyed by
//! `EntityId`, so every scan visits entities in ascending id order.
//!
//! # Invariants
//! - Every entity created by the factory has a `Transform` and a `Tag`.
//! - Destroying an entity removes all of its components at once.
//! - Mesh vertex id payloads equal the owning entity's pick id after every
//!   attach and every geometry recomputation.

mod camera;
mod components;
mod generator;
mod geometry;
mod store;

pub use camera::{ProjectionType, SceneCamera};
pub use components::{Camera, Light, LineRenderer, MeshRenderer, QuadRenderer, Tag};
pub use easel_common::{EntityId, EntityUuid, SceneError, Transform};
pub use generator::{LineGenerator, MAX_GENERATED_POINTS, apply_line_generators};
pub use geometry::{Line, Mesh, MeshVertex, ObjMesh, QUAD_INDICES, QUAD_POSITIONS};
pub use store::{AttachContext, Component, ComponentEvent, ComponentStore, Storages};
