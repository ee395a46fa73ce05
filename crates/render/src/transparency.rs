//! Painter's-algorithm ordering for transparent meshes.

use easel_common::{EntityId, Transform};
use easel_ecs::{ComponentStore, Mesh, MeshRenderer, ObjMesh};
use glam::{Mat4, Vec3};

use crate::error::RenderError;
use crate::resources::ShaderHandle;

/// One transparent triangle queued for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransparentTriangle {
    pub entity: EntityId,
    /// Triangle index within the entity's mesh.
    pub triangle: usize,
    pub shader: ShaderHandle,
    pub model: Mat4,
    /// Smallest world-space distance from a corner to the camera.
    pub distance: f32,
}

/// Geometry rendered by an entity's `MeshRenderer`: `Mesh` first, then `ObjMesh`.
pub fn mesh_of(store: &ComponentStore, entity: EntityId) -> Result<&Mesh, RenderError> {
    if let Some(mesh) = store.try_get::<Mesh>(entity) {
        return Ok(mesh);
    }
    store
        .try_get::<ObjMesh>(entity)
        .map(ObjMesh::mesh)
        .ok_or(RenderError::MissingGeometry(entity))
}

/// Collects every triangle of every transparent mesh and orders them far to near.
///
/// The buffer is reused across frames.
#[derive(Debug, Default)]
pub struct TransparencySorter {
    triangles: Vec<TransparentTriangle>,
}

impl TransparencySorter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the draw order for this frame.
    ///
    /// Collection follows ascending entity id then triangle index; the stable
    /// sort keeps that order for equal distances.
    pub fn sort(
        &mut self,
        store: &ComponentStore,
        camera_position: Vec3,
        shader: ShaderHandle,
    ) -> Result<&[TransparentTriangle], RenderError> {
        self.triangles.clear();
        for (entity, renderer) in store.iter::<MeshRenderer>() {
            if !renderer.is_transparent {
                continue;
            }
            let model = store.get::<Transform>(entity)?.world_matrix();
            let mesh = mesh_of(store, entity)?;
            for triangle in 0..mesh.triangle_count() {
                let Some(corners) = mesh.triangle(triangle) else {
                    tracing::warn!(entity = %entity, triangle, "triangle index out of range, skipped");
                    continue;
                };
                let distance = corners
                    .iter()
                    .map(|&p| model.transform_point3(p).distance(camera_position))
                    .fold(f32::INFINITY, f32::min);
                self.triangles.push(TransparentTriangle {
                    entity,
                    triangle,
                    shader,
                    model,
                    distance,
                });
            }
        }
        self.triangles
            .sort_by(|a, b| b.distance.total_cmp(&a.distance));
        Ok(&self.triangles)
    }

    /// Order produced by the last `sort`.
    pub fn order(&self) -> &[TransparentTriangle] {
        &self.triangles
    }
}
