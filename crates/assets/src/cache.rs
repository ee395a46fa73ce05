use std::collections::BTreeMap;
use std::path::Path;

use easel_common::EntityId;
use easel_ecs::{ComponentStore, Mesh, ObjMesh};
use sha2::{Digest, Sha256};

use crate::error::AssetError;
use crate::obj::ObjLoader;

/// Content-addressed asset ID: the first 8 bytes of the SHA-256 of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(head))
    }
}

/// Parsed meshes keyed by source content.
#[derive(Debug, Default)]
pub struct MeshCache {
    meshes: BTreeMap<AssetId, Mesh>,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an OBJ file, parsing it only if its content has not been seen.
    pub fn load_obj(&mut self, path: impl AsRef<Path>) -> Result<(AssetId, Mesh), AssetError> {
        let bytes = std::fs::read(path.as_ref())?;
        let id = AssetId::of(&bytes);
        if let Some(mesh) = self.meshes.get(&id) {
            tracing::debug!(path = %path.as_ref().display(), "mesh cache hit");
            return Ok((id, mesh.clone()));
        }
        let text = String::from_utf8_lossy(&bytes);
        let mesh = ObjLoader::parse(&text)?;
        self.meshes.insert(id, mesh.clone());
        Ok((id, mesh))
    }

    pub fn get(&self, id: AssetId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// Reload the geometry of `entity`'s `ObjMesh` from its path.
///
/// On failure the previous geometry stays in place and a warning is logged.
/// Returns whether new geometry was installed.
pub fn reload_obj_mesh(store: &mut ComponentStore, entity: EntityId, cache: &mut MeshCache) -> bool {
    let Some(path) = store.try_get::<ObjMesh>(entity).map(|obj| obj.path.clone()) else {
        tracing::warn!(%entity, "reload requested for entity without ObjMesh");
        return false;
    };
    match cache.load_obj(&path) {
        Ok((_, mesh)) => match store.get_mut::<ObjMesh>(entity) {
            Ok(obj) => {
                obj.replace_mesh(mesh);
                tracing::info!(%entity, path = %path, "OBJ mesh loaded");
                true
            }
            Err(err) => {
                tracing::warn!(%err, "ObjMesh vanished during reload");
                false
            }
        },
        Err(err) => {
            tracing::warn!(%entity, path = %path, %err, "OBJ load failed, keeping previous geometry");
            false
        }
    }
}

/// Load every `ObjMesh` in the store. Returns how many loaded successfully.
pub fn load_obj_meshes(store: &mut ComponentStore, cache: &mut MeshCache) -> usize {
    let entities: Vec<EntityId> = store.iter::<ObjMesh>().map(|(e, _)| e).collect();
    entities
        .into_iter()
        .filter(|&e| reload_obj_mesh(store, e, cache))
        .count()
}
