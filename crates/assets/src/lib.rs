//! Mesh assets: OBJ parsing and a content-addressed cache.
//!
//! Meshes are identified by the SHA-256 of their source bytes, so two paths
//! holding the same file share one parsed mesh.
//!
//! # Invariants
//! - A failed load never clobbers geometry that is already on an entity.
//! - Loaded meshes are unstamped; attaching or replacing stamps entity ids.

mod cache;
mod error;
mod obj;

pub use cache::{AssetId, MeshCache, load_obj_meshes, reload_obj_mesh};
pub use error::AssetError;
pub use obj::ObjLoader;
