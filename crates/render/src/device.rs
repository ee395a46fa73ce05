//! Thin graphics-command abstraction between the pipeline and a backend.

use easel_common::EntityId;
use easel_ecs::MeshVertex;
use glam::{Mat4, Vec3, Vec4};

use crate::resources::ShaderHandle;

/// Maximum number of lights uploaded per frame.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightInfo {
    pub position: Vec3,
    pub intensity: f32,
}

impl LightInfo {
    /// Placeholder light supplied when the scene has none.
    pub const ZERO: Self = Self {
        position: Vec3::ZERO,
        intensity: 0.0,
    };
}

/// Per-frame uniforms handed to `begin_scene`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneUniforms {
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    /// Never empty and never longer than [`MAX_LIGHTS`].
    pub lights: Vec<LightInfo>,
}

/// Geometry of a single draw.
#[derive(Debug, Clone, Copy)]
pub enum Geometry<'a> {
    /// The shared unit quad.
    Quad,
    /// Line strip, closed when `looped`.
    Lines { points: &'a [Vec3], looped: bool },
    /// Indexed triangle list; `indices` may be a sub-range of a larger mesh.
    Triangles {
        vertices: &'a [MeshVertex],
        indices: &'a [u32],
    },
}

#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub geometry: Geometry<'a>,
    pub model: Mat4,
    pub color: Vec4,
    pub shader: ShaderHandle,
    /// Id written for geometry without a per-vertex payload. `None` means no id write.
    pub entity: Option<EntityId>,
}

/// Command sink for one frame.
///
/// Calls arrive in the order `begin_scene`, clears, draws, `end_scene`.
/// Depth testing is always on; only depth writes and blending are toggled.
pub trait GraphicsDevice {
    fn begin_scene(&mut self, uniforms: &SceneUniforms);
    fn set_clear_color(&mut self, color: Vec4);
    /// Clear color and depth.
    fn clear(&mut self);
    /// Fill the id attachment with `value`.
    fn clear_id_attachment(&mut self, value: i32);
    fn set_depth_write(&mut self, enabled: bool);
    fn set_blending(&mut self, enabled: bool);
    fn draw(&mut self, call: &DrawCall<'_>);
    fn end_scene(&mut self);
}

/// Owned summary of a draw, as kept by [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    Quad,
    Lines { point_count: usize, looped: bool },
    Triangles { index_count: usize, vertex_ids: Vec<i32> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub kind: DrawKind,
    pub model: Mat4,
    pub color: Vec4,
    pub shader: ShaderHandle,
    pub entity: Option<EntityId>,
    pub depth_write: bool,
    pub blending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginScene(SceneUniforms),
    SetClearColor(Vec4),
    Clear,
    ClearIdAttachment(i32),
    SetDepthWrite(bool),
    SetBlending(bool),
    Draw(RecordedDraw),
    EndScene,
}

/// Device that records every command instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: Vec<Command>,
    depth_write: bool,
    blending: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            depth_write: true,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl GraphicsDevice for RecordingDevice {
    fn begin_scene(&mut self, uniforms: &SceneUniforms) {
        self.commands.push(Command::BeginScene(uniforms.clone()));
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.commands.push(Command::SetClearColor(color));
    }

    fn clear(&mut self) {
        self.commands.push(Command::Clear);
    }

    fn clear_id_attachment(&mut self, value: i32) {
        self.commands.push(Command::ClearIdAttachment(value));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
        self.commands.push(Command::SetDepthWrite(enabled));
    }

    fn set_blending(&mut self, enabled: bool) {
        self.blending = enabled;
        self.commands.push(Command::SetBlending(enabled));
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let kind = match call.geometry {
            Geometry::Quad => DrawKind::Quad,
            Geometry::Lines { points, looped } => DrawKind::Lines {
                point_count: points.len(),
                looped,
            },
            Geometry::Triangles { vertices, indices } => DrawKind::Triangles {
                index_count: indices.len(),
                vertex_ids: indices
                    .iter()
                    .filter_map(|&i| vertices.get(i as usize))
                    .map(|v| v.entity_id)
                    .collect(),
            },
        };
        self.commands.push(Command::Draw(RecordedDraw {
            kind,
            model: call.model,
            color: call.color,
            shader: call.shader,
            entity: call.entity,
            depth_write: self.depth_write,
            blending: self.blending,
        }));
    }

    fn end_scene(&mut self) {
        self.commands.push(Command::EndScene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_device_tracks_state_per_draw() {
        let mut device = RecordingDevice::new();
        let call = DrawCall {
            geometry: Geometry::Quad,
            model: Mat4::IDENTITY,
            color: Vec4::ONE,
            shader: ShaderHandle(0),
            entity: Some(EntityId(1)),
        };
        device.draw(&call);
        device.set_depth_write(false);
        device.set_blending(true);
        device.draw(&call);

        let draws: Vec<_> = device.draws().collect();
        assert_eq!(draws.len(), 2);
        assert!(draws[0].depth_write && !draws[0].blending);
        assert!(!draws[1].depth_write && draws[1].blending);
    }

    #[test]
    fn triangle_draw_records_vertex_payloads() {
        let vertices = [
            MeshVertex {
                position: Vec3::ZERO,
                entity_id: 4,
            },
            MeshVertex {
                position: Vec3::X,
                entity_id: 4,
            },
            MeshVertex {
                position: Vec3::Y,
                entity_id: 4,
            },
        ];
        let mut device = RecordingDevice::new();
        device.draw(&DrawCall {
            geometry: Geometry::Triangles {
                vertices: &vertices,
                indices: &[0, 1, 2],
            },
            model: Mat4::IDENTITY,
            color: Vec4::ONE,
            shader: ShaderHandle(2),
            entity: None,
        });
        let draw = device.draws().next().unwrap();
        assert_eq!(
            draw.kind,
            DrawKind::Triangles {
                index_count: 3,
                vertex_ids: vec![4, 4, 4]
            }
        );
    }
}
