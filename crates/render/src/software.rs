//! CPU rasterizer. Renders into a [`Framebuffer`] so headless tools and tests
//! can run the full pipeline and read ids back without a GPU.

use easel_ecs::{MeshVertex, QUAD_INDICES, QUAD_POSITIONS};
use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::device::{DrawCall, Geometry, GraphicsDevice, LightInfo, SceneUniforms};
use crate::error::PickError;
use crate::framebuffer::{Framebuffer, FramebufferSpec, PickingTarget};
use crate::resources::{LIT_SHADER, ShaderHandle, ShaderLibrary};

const MIN_W: f32 = 1e-6;
const AMBIENT: f32 = 0.3;

/// Screen-space vertex: pixel position (bottom-left origin) and depth in [0, 1].
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    pos: Vec2,
    depth: f32,
}

pub struct SoftwareDevice {
    target: Framebuffer,
    view_projection: Mat4,
    lights: Vec<LightInfo>,
    clear_color: Vec4,
    depth_write: bool,
    blending: bool,
    lit_shader: Option<ShaderHandle>,
    in_scene: bool,
}

impl SoftwareDevice {
    pub fn new(width: u32, height: u32, shaders: &ShaderLibrary) -> Self {
        Self {
            target: Framebuffer::new(FramebufferSpec::editor(width, height)),
            view_projection: Mat4::IDENTITY,
            lights: Vec::new(),
            clear_color: Vec4::ZERO,
            depth_write: true,
            blending: false,
            lit_shader: shaders.find(LIT_SHADER),
            in_scene: false,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.target
    }

    fn project(&self, world: Vec3) -> Option<ScreenVertex> {
        let clip = self.view_projection * world.extend(1.0);
        if clip.w <= MIN_W {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if ndc.z < 0.0 {
            return None;
        }
        let (w, h) = (self.target.width() as f32, self.target.height() as f32);
        Some(ScreenVertex {
            pos: Vec2::new((ndc.x + 1.0) * 0.5 * w, (ndc.y + 1.0) * 0.5 * h),
            depth: ndc.z,
        })
    }

    fn shade(&self, corners: [Vec3; 3], color: Vec4, shader: ShaderHandle) -> Vec4 {
        if Some(shader) != self.lit_shader {
            return color;
        }
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        let centre = (corners[0] + corners[1] + corners[2]) / 3.0;
        let diffuse: f32 = self
            .lights
            .iter()
            .map(|l| l.intensity * normal.dot((l.position - centre).normalize_or_zero()).abs())
            .sum();
        let factor = (AMBIENT + (1.0 - AMBIENT) * diffuse).min(1.0);
        (color.xyz() * factor).extend(color.w)
    }

    fn fragment(&mut self, x: i32, y: i32, depth: f32, color: Vec4, id: Option<i32>) {
        if !(0.0..=1.0).contains(&depth) {
            return;
        }
        let width = self.target.width() as i32;
        let i = (y * width + x) as usize;
        if depth >= self.target.depth_at(i) {
            return;
        }
        let out = if self.blending {
            let dst = self.target.color_at_index(i);
            let a = color.w;
            let rgb = color.xyz() * a + dst.xyz() * (1.0 - a);
            rgb.extend(a + dst.w * (1.0 - a))
        } else {
            color
        };
        self.target
            .write(i, out, self.depth_write.then_some(depth), id);
    }

    fn raster_triangle(&mut self, corners: [Vec3; 3], color: Vec4, id: Option<i32>) {
        // Triangles crossing the near plane are rejected outright.
        let (Some(a), Some(mut b), Some(mut c)) = (
            self.project(corners[0]),
            self.project(corners[1]),
            self.project(corners[2]),
        ) else {
            return;
        };
        let mut area = edge(a.pos, b.pos, c.pos);
        if area.abs() < f32::EPSILON {
            return;
        }
        if area < 0.0 {
            std::mem::swap(&mut b, &mut c);
            area = -area;
        }

        let (w, h) = (self.target.width() as i32, self.target.height() as i32);
        let min = a.pos.min(b.pos).min(c.pos);
        let max = a.pos.max(b.pos).max(c.pos);
        let x0 = (min.x.floor() as i32).max(0);
        let y0 = (min.y.floor() as i32).max(0);
        let x1 = (max.x.ceil() as i32).min(w - 1);
        let y1 = (max.y.ceil() as i32).min(h - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let wa = edge(b.pos, c.pos, p);
                let wb = edge(c.pos, a.pos, p);
                let wc = edge(a.pos, b.pos, p);
                if !covers(wa, b.pos, c.pos) || !covers(wb, c.pos, a.pos) || !covers(wc, a.pos, b.pos)
                {
                    continue;
                }
                let depth = (wa * a.depth + wb * b.depth + wc * c.depth) / area;
                self.fragment(x, y, depth, color, id);
            }
        }
    }

    fn raster_segment(&mut self, from: Vec3, to: Vec3, color: Vec4) {
        let (Some(a), Some(b)) = (self.project(from), self.project(to)) else {
            return;
        };
        let (w, h) = (self.target.width() as i32, self.target.height() as i32);
        let delta = b.pos - a.pos;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as i32;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let p = a.pos + delta * t;
            let (x, y) = (p.x.floor() as i32, p.y.floor() as i32);
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let depth = a.depth + (b.depth - a.depth) * t;
            self.fragment(x, y, depth, color, None);
        }
    }

    fn draw_triangles(&mut self, call: &DrawCall<'_>, vertices: &[MeshVertex], indices: &[u32]) {
        let fallback = call.entity.map(|e| e.pick_id());
        for tri in indices.chunks_exact(3) {
            let fetch = |i: u32| vertices.get(i as usize);
            let (Some(v0), Some(v1), Some(v2)) = (fetch(tri[0]), fetch(tri[1]), fetch(tri[2])) else {
                tracing::warn!("triangle index out of range, skipped");
                continue;
            };
            let corners = [v0, v1, v2].map(|v| call.model.transform_point3(v.position));
            let id = if v0.entity_id >= 0 {
                Some(v0.entity_id)
            } else {
                fallback
            };
            let color = self.shade(corners, call.color, call.shader);
            self.raster_triangle(corners, color, id);
        }
    }
}

/// Twice the signed area of (a, b, p); positive when p is left of a→b.
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Coverage test with a tie rule so a pixel centre on a shared edge belongs to
/// exactly one of the two triangles.
fn covers(weight: f32, a: Vec2, b: Vec2) -> bool {
    if weight != 0.0 {
        return weight > 0.0;
    }
    let d = b - a;
    d.y > 0.0 || (d.y == 0.0 && d.x < 0.0)
}

impl GraphicsDevice for SoftwareDevice {
    fn begin_scene(&mut self, uniforms: &SceneUniforms) {
        debug_assert!(!self.in_scene, "begin_scene called twice");
        self.in_scene = true;
        self.view_projection = uniforms.view_projection;
        self.lights.clone_from(&uniforms.lights);
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    fn clear(&mut self) {
        self.target.clear_color(self.clear_color);
        self.target.clear_depth();
    }

    fn clear_id_attachment(&mut self, value: i32) {
        self.target.clear_id_attachment(value);
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_blending(&mut self, enabled: bool) {
        self.blending = enabled;
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        match call.geometry {
            Geometry::Quad => {
                let id = call.entity.map(|e| e.pick_id());
                let corners = QUAD_POSITIONS.map(|p| call.model.transform_point3(p));
                for tri in QUAD_INDICES.chunks_exact(3) {
                    let tri = [
                        corners[tri[0] as usize],
                        corners[tri[1] as usize],
                        corners[tri[2] as usize],
                    ];
                    let color = self.shade(tri, call.color, call.shader);
                    self.raster_triangle(tri, color, id);
                }
            }
            Geometry::Lines { points, looped } => {
                let world: Vec<Vec3> = points
                    .iter()
                    .map(|&p| call.model.transform_point3(p))
                    .collect();
                for pair in world.windows(2) {
                    self.raster_segment(pair[0], pair[1], call.color);
                }
                if looped && world.len() > 2 {
                    self.raster_segment(world[world.len() - 1], world[0], call.color);
                }
            }
            Geometry::Triangles { vertices, indices } => {
                self.draw_triangles(call, vertices, indices);
            }
        }
    }

    fn end_scene(&mut self) {
        self.in_scene = false;
    }
}

impl PickingTarget for SoftwareDevice {
    fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.target.resize(width, height);
    }

    fn read_pixel(&self, attachment: usize, x: i32, y: i32) -> Result<i32, PickError> {
        self.target.read_pixel(attachment, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_common::EntityId;

    const ID: usize = FramebufferSpec::ID_ATTACHMENT;

    fn device(size: u32) -> SoftwareDevice {
        let mut device = SoftwareDevice::new(size, size, &ShaderLibrary::default());
        device.begin_scene(&SceneUniforms {
            view_projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            lights: vec![LightInfo::ZERO],
        });
        device.clear();
        device.clear_id_attachment(-1);
        device
    }

    fn quad(entity: u32, z: f32, color: Vec4) -> DrawCall<'static> {
        DrawCall {
            geometry: Geometry::Quad,
            model: Mat4::from_translation(Vec3::new(0.0, 0.0, z)) * Mat4::from_scale(Vec3::splat(2.0)),
            color,
            shader: ShaderHandle(1),
            entity: Some(EntityId(entity)),
        }
    }

    #[test]
    fn quad_fills_and_writes_id() {
        let mut d = device(8);
        d.draw(&quad(5, 0.5, Vec4::ONE));
        assert_eq!(d.read_pixel(ID, 0, 0), Ok(5));
        assert_eq!(d.read_pixel(ID, 7, 7), Ok(5));
    }

    #[test]
    fn depth_test_keeps_nearest() {
        let mut d = device(4);
        d.draw(&quad(1, 0.2, Vec4::ONE));
        d.draw(&quad(2, 0.6, Vec4::ONE));
        assert_eq!(d.read_pixel(ID, 2, 2), Ok(1));
    }

    #[test]
    fn disabled_depth_write_lets_later_far_geometry_through() {
        let mut d = device(4);
        d.set_depth_write(false);
        d.draw(&quad(1, 0.2, Vec4::ONE));
        d.draw(&quad(2, 0.6, Vec4::ONE));
        assert_eq!(d.read_pixel(ID, 2, 2), Ok(2));
    }

    #[test]
    fn blending_mixes_with_destination() {
        let mut d = device(2);
        d.draw(&quad(1, 0.6, Vec4::new(0.0, 0.0, 1.0, 1.0)));
        d.set_blending(true);
        d.draw(&quad(2, 0.2, Vec4::new(1.0, 0.0, 0.0, 0.5)));
        let c = d.framebuffer().color_at(0, 0).unwrap();
        assert_eq!(c[0], 128);
        assert_eq!(c[2], 128);
    }

    #[test]
    fn lines_do_not_write_ids() {
        let mut d = device(8);
        let points = [Vec3::new(-1.0, 0.0, 0.5), Vec3::new(1.0, 0.0, 0.5)];
        d.draw(&DrawCall {
            geometry: Geometry::Lines {
                points: &points,
                looped: false,
            },
            model: Mat4::IDENTITY,
            color: Vec4::ONE,
            shader: ShaderHandle(0),
            entity: Some(EntityId(3)),
        });
        assert_eq!(d.read_pixel(ID, 4, 4), Ok(-1));
        assert_eq!(d.framebuffer().color_at(4, 4), Some([255; 4]));
    }

    #[test]
    fn shared_edge_is_covered_once() {
        // Two halves of a quad blended at alpha 0.5 must not double up on the diagonal.
        let mut d = device(8);
        d.set_clear_color(Vec4::new(0.0, 0.0, 0.0, 1.0));
        d.clear();
        d.set_blending(true);
        d.set_depth_write(false);
        d.draw(&quad(1, 0.5, Vec4::new(1.0, 1.0, 1.0, 0.5)));
        let first = d.framebuffer().color_at(0, 0).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(d.framebuffer().color_at(x, y).unwrap(), first);
            }
        }
    }

    #[test]
    fn triangles_prefer_vertex_payload() {
        let mut d = device(4);
        let vertices = [
            MeshVertex { position: Vec3::new(-1.0, -1.0, 0.5), entity_id: 9 },
            MeshVertex { position: Vec3::new(3.0, -1.0, 0.5), entity_id: 9 },
            MeshVertex { position: Vec3::new(-1.0, 3.0, 0.5), entity_id: 9 },
        ];
        d.draw(&DrawCall {
            geometry: Geometry::Triangles {
                vertices: &vertices,
                indices: &[0, 1, 2],
            },
            model: Mat4::IDENTITY,
            color: Vec4::ONE,
            shader: ShaderHandle(2),
            entity: Some(EntityId(1)),
        });
        assert_eq!(d.read_pixel(ID, 1, 1), Ok(9));
    }
}
