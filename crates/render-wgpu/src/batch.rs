//! CPU-side frame assembly. Draw calls are flattened into world-space vertices
//! and grouped into runs that share a pipeline, preserving submission order.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use easel_ecs::{MeshVertex, QUAD_INDICES, QUAD_POSITIONS};
use easel_render::{DrawCall, Geometry, ShaderHandle};
use glam::{Vec3, Vec4};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub entity_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Topology {
    Lines,
    Triangles,
}

/// Fixed-function state that selects a pipeline variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct PipelineKey {
    pub topology: Topology,
    pub depth_write: bool,
    pub blending: bool,
    pub write_id: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Batch {
    pub key: PipelineKey,
    pub vertices: Range<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct FrameBatches {
    vertices: Vec<GpuVertex>,
    batches: Vec<Batch>,
}

impl FrameBatches {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.batches.clear();
    }

    pub fn vertices(&self) -> &[GpuVertex] {
        &self.vertices
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Flatten one draw call. `lit` selects face-normal shading.
    pub fn push_draw(
        &mut self,
        call: &DrawCall<'_>,
        lit: bool,
        depth_write: bool,
        blending: bool,
    ) {
        let fallback = call.entity.map(|e| e.pick_id());
        match call.geometry {
            Geometry::Quad => {
                let corners = QUAD_POSITIONS.map(|p| call.model.transform_point3(p));
                for tri in QUAD_INDICES.chunks_exact(3) {
                    let tri = [0, 1, 2].map(|k| corners[tri[k] as usize]);
                    self.push_triangle(tri, call.color, lit, fallback, depth_write, blending);
                }
            }
            Geometry::Lines { points, looped } => {
                let world: Vec<Vec3> = points
                    .iter()
                    .map(|&p| call.model.transform_point3(p))
                    .collect();
                let key = PipelineKey {
                    topology: Topology::Lines,
                    depth_write,
                    blending,
                    write_id: false,
                };
                for pair in world.windows(2) {
                    self.push_segment(key, pair[0], pair[1], call.color);
                }
                if looped && world.len() > 2 {
                    self.push_segment(key, world[world.len() - 1], world[0], call.color);
                }
            }
            Geometry::Triangles { vertices, indices } => {
                self.push_mesh(call, vertices, indices, lit, fallback, depth_write, blending);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_mesh(
        &mut self,
        call: &DrawCall<'_>,
        vertices: &[MeshVertex],
        indices: &[u32],
        lit: bool,
        fallback: Option<i32>,
        depth_write: bool,
        blending: bool,
    ) {
        for tri in indices.chunks_exact(3) {
            let fetch = |i: u32| vertices.get(i as usize);
            let (Some(v0), Some(v1), Some(v2)) = (fetch(tri[0]), fetch(tri[1]), fetch(tri[2]))
            else {
                tracing::warn!("triangle index out of range, skipped");
                continue;
            };
            let corners = [v0, v1, v2].map(|v| call.model.transform_point3(v.position));
            let id = if v0.entity_id >= 0 {
                Some(v0.entity_id)
            } else {
                fallback
            };
            self.push_triangle(corners, call.color, lit, id, depth_write, blending);
        }
    }

    fn push_triangle(
        &mut self,
        corners: [Vec3; 3],
        color: Vec4,
        lit: bool,
        id: Option<i32>,
        depth_write: bool,
        blending: bool,
    ) {
        let normal = if lit {
            (corners[1] - corners[0])
                .cross(corners[2] - corners[0])
                .normalize_or_zero()
        } else {
            Vec3::ZERO
        };
        let key = PipelineKey {
            topology: Topology::Triangles,
            depth_write,
            blending,
            write_id: id.is_some(),
        };
        let entity_id = id.unwrap_or(-1);
        self.extend(
            key,
            corners.map(|p| GpuVertex {
                position: p.to_array(),
                normal: normal.to_array(),
                color: color.to_array(),
                entity_id,
            }),
        );
    }

    fn push_segment(&mut self, key: PipelineKey, from: Vec3, to: Vec3, color: Vec4) {
        self.extend(
            key,
            [from, to].map(|p| GpuVertex {
                position: p.to_array(),
                normal: [0.0; 3],
                color: color.to_array(),
                entity_id: -1,
            }),
        );
    }

    fn extend<const N: usize>(&mut self, key: PipelineKey, vertices: [GpuVertex; N]) {
        let start = self.vertices.len() as u32;
        self.vertices.extend(vertices);
        let end = self.vertices.len() as u32;
        match self.batches.last_mut() {
            Some(last) if last.key == key && last.vertices.end == start => {
                last.vertices.end = end;
            }
            _ => self.batches.push(Batch {
                key,
                vertices: start..end,
            }),
        }
    }
}

/// Whether `shader` is the lit mesh shader.
pub(crate) fn is_lit(shader: ShaderHandle, lit_shader: Option<ShaderHandle>) -> bool {
    Some(shader) == lit_shader
}
