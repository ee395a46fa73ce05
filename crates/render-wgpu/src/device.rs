use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use easel_render::resources::LIT_SHADER;
use easel_render::{
    DrawCall, GraphicsDevice, MAX_LIGHTS, PickError, PickingTarget, SceneUniforms, ShaderHandle,
    ShaderLibrary,
};
use glam::Vec4;

use crate::batch::{FrameBatches, GpuVertex, PipelineKey, Topology, is_lit};
use crate::shaders;
use crate::target::{COLOR_FORMAT, DEPTH_FORMAT, ID_FORMAT, RenderTargets};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    lights: [[f32; 4]; MAX_LIGHTS],
    light_count: [u32; 4],
}

impl Uniforms {
    fn from_scene(scene: &SceneUniforms) -> Self {
        let mut lights = [[0.0; 4]; MAX_LIGHTS];
        for (slot, light) in lights.iter_mut().zip(&scene.lights) {
            *slot = light.position.extend(light.intensity).to_array();
        }
        Self {
            view_proj: scene.view_projection.to_cols_array_2d(),
            camera_position: scene.camera_position.extend(1.0).to_array(),
            lights,
            light_count: [scene.lights.len().min(MAX_LIGHTS) as u32, 0, 0, 0],
        }
    }
}

/// Clears requested for the next submission. `None` keeps previous contents.
#[derive(Debug, Default, Clone, Copy)]
struct PendingClears {
    color: Option<Vec4>,
    id: Option<i32>,
}

/// wgpu implementation of [`GraphicsDevice`] rendering into off-screen
/// targets that the editor shows in its viewport panel.
///
/// Draws are collected between `begin_scene` and `end_scene` and submitted
/// as a single render pass.
pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: BTreeMap<PipelineKey, wgpu::RenderPipeline>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,
    targets: RenderTargets,
    generation: u64,
    frame: FrameBatches,
    clears: PendingClears,
    clear_color: Vec4,
    depth_write: bool,
    blending: bool,
    lit_shader: Option<ShaderHandle>,
}

impl WgpuDevice {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        width: u32,
        height: u32,
        shaders: &ShaderLibrary,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniforms"),
            size: size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let vertex_capacity = 1024;
        let vertex_buffer = Self::create_vertex_buffer(&device, vertex_capacity);
        let targets = RenderTargets::new(&device, width, height);

        Self {
            shader,
            pipeline_layout,
            pipelines: BTreeMap::new(),
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            vertex_capacity,
            targets,
            generation: 0,
            frame: FrameBatches::default(),
            clears: PendingClears::default(),
            clear_color: Vec4::ZERO,
            depth_write: true,
            blending: false,
            lit_shader: shaders.find(LIT_SHADER),
            device,
            queue,
        }
    }

    /// View of the display color target, for sampling in the UI.
    pub fn color_view(&self) -> &wgpu::TextureView {
        self.targets.color_view()
    }

    /// Bumped whenever the targets are reallocated, so views handed to the UI
    /// can be re-registered.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_vertices"),
            size: capacity * size_of::<GpuVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        tracing::debug!(?key, "creating pipeline variant");
        let pipeline = self.create_pipeline(key);
        self.pipelines.insert(key, pipeline);
    }

    fn create_pipeline(&self, key: PipelineKey) -> wgpu::RenderPipeline {
        let blend = if key.blending {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        };
        let id_writes = if key.write_id {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        };
        let topology = match key.topology {
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        };

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("scene_pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: size_of::<GpuVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Float32x4,
                            3 => Sint32,
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[
                        Some(wgpu::ColorTargetState {
                            format: COLOR_FORMAT,
                            blend: Some(blend),
                            write_mask: wgpu::ColorWrites::ALL,
                        }),
                        Some(wgpu::ColorTargetState {
                            format: ID_FORMAT,
                            blend: None,
                            write_mask: id_writes,
                        }),
                    ],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: key.depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
    }

    fn upload_vertices(&mut self) {
        let needed = self.frame.vertices().len() as u64;
        if needed > self.vertex_capacity {
            self.vertex_capacity = needed.next_power_of_two();
            self.vertex_buffer = Self::create_vertex_buffer(&self.device, self.vertex_capacity);
            tracing::debug!(capacity = self.vertex_capacity, "vertex buffer grown");
        }
        if !self.frame.is_empty() {
            self.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(self.frame.vertices()),
            );
        }
    }

    fn submit(&mut self) {
        let keys: BTreeSet<PipelineKey> = self.frame.batches().iter().map(|b| b.key).collect();
        for key in keys {
            self.ensure_pipeline(key);
        }
        self.upload_vertices();

        let clears = std::mem::take(&mut self.clears);
        let color_load = match clears.color {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(c.x),
                g: f64::from(c.y),
                b: f64::from(c.z),
                a: f64::from(c.w),
            }),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = match clears.color {
            Some(_) => wgpu::LoadOp::Clear(1.0),
            None => wgpu::LoadOp::Load,
        };
        let id_load = match clears.id {
            Some(value) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(value),
                g: 0.0,
                b: 0.0,
                a: 0.0,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: self.targets.color_view(),
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: color_load,
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: self.targets.id_view(),
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: id_load,
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.targets.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            for batch in self.frame.batches() {
                let Some(pipeline) = self.pipelines.get(&batch.key) else {
                    tracing::warn!(key = ?batch.key, "no pipeline for batch, skipped");
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.draw(batch.vertices.clone(), 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        tracing::trace!(
            vertices = self.frame.vertices().len(),
            batches = self.frame.batches().len(),
            "scene submitted"
        );
    }
}

impl GraphicsDevice for WgpuDevice {
    fn begin_scene(&mut self, uniforms: &SceneUniforms) {
        self.frame.clear();
        self.clears = PendingClears::default();
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::from_scene(uniforms)),
        );
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    fn clear(&mut self) {
        self.clears.color = Some(self.clear_color);
    }

    fn clear_id_attachment(&mut self, value: i32) {
        self.clears.id = Some(value);
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_blending(&mut self, enabled: bool) {
        self.blending = enabled;
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let lit = is_lit(call.shader, self.lit_shader);
        self.frame
            .push_draw(call, lit, self.depth_write, self.blending);
    }

    fn end_scene(&mut self) {
        self.submit();
    }
}

impl PickingTarget for WgpuDevice {
    fn size(&self) -> (u32, u32) {
        self.targets.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == self.targets.size() {
            return;
        }
        tracing::debug!(width, height, "viewport targets resized");
        self.targets = RenderTargets::new(&self.device, width, height);
        self.generation += 1;
    }

    fn read_pixel(&self, attachment: usize, x: i32, y: i32) -> Result<i32, PickError> {
        self.targets
            .read_id(&self.device, &self.queue, attachment, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_render::LightInfo;
    use glam::{Mat4, Vec3};

    #[test]
    fn uniform_layout_matches_wgsl() {
        // mat4 + vec4 + 8 * vec4 + vec4<u32>
        assert_eq!(size_of::<Uniforms>(), 64 + 16 + 16 * MAX_LIGHTS + 16);
    }

    #[test]
    fn uniforms_pack_lights() {
        let u = Uniforms::from_scene(&SceneUniforms {
            view_projection: Mat4::IDENTITY,
            camera_position: Vec3::new(0.0, 0.0, 5.0),
            lights: vec![LightInfo {
                position: Vec3::new(1.0, 2.0, 3.0),
                intensity: 0.5,
            }],
        });
        assert_eq!(u.light_count[0], 1);
        assert_eq!(u.lights[0], [1.0, 2.0, 3.0, 0.5]);
        assert_eq!(u.lights[1], [0.0; 4]);
        assert_eq!(u.camera_position, [0.0, 0.0, 5.0, 1.0]);
        assert_eq!(u.view_proj, Mat4::IDENTITY.to_cols_array_2d());
    }
}
