//! Per-frame render sequence: camera, clears, line pass, opaque pass,
//! back-to-front transparent pass.

use easel_common::Transform;
use easel_ecs::{ComponentStore, Light, Line, LineRenderer, MeshRenderer, QuadRenderer};

use crate::camera::{CameraResolver, CameraSource, InteractiveCamera, ResolvedCamera};
use crate::device::{DrawCall, Geometry, GraphicsDevice, LightInfo, MAX_LIGHTS, SceneUniforms};
use crate::error::RenderError;
use crate::resources::{FLAT_QUAD_SHADER, LIT_SHADER, RenderSettings, ResourceContext, SOLID_COLOR_SHADER};
use crate::transparency::{TransparencySorter, TransparentTriangle, mesh_of};

/// Stage of the frame currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePhase {
    #[default]
    Idle,
    BeginScene,
    LinePass,
    OpaquePass,
    TransparentPass,
    EndScene,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub line_draws: usize,
    pub opaque_draws: usize,
    pub transparent_triangles: usize,
    pub camera: CameraSource,
}

/// Drives one frame from scene state to device commands.
///
/// The pipeline only reads the store. All scene mutation happens between frames.
#[derive(Debug, Default)]
pub struct RenderPipeline {
    settings: RenderSettings,
    resolver: CameraResolver,
    sorter: TransparencySorter,
    phase: FramePhase,
    frame: u64,
}

impl RenderPipeline {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    /// Back-to-front order used by the last frame's transparent pass.
    pub fn transparent_order(&self) -> &[TransparentTriangle] {
        self.sorter.order()
    }

    fn enter(&mut self, phase: FramePhase) {
        tracing::trace!(?phase, frame = self.frame, "frame phase");
        self.phase = phase;
    }

    /// Render one frame.
    ///
    /// On error the frame is abandoned mid-way and the pipeline returns to
    /// `Idle`; the device may hold a partially recorded frame.
    pub fn render_frame(
        &mut self,
        store: &ComponentStore,
        fallback: &dyn InteractiveCamera,
        device: &mut dyn GraphicsDevice,
        resources: &ResourceContext,
    ) -> Result<FrameStats, RenderError> {
        let _span = tracing::debug_span!("render_frame", frame = self.frame).entered();
        let result = self.run(store, fallback, device, resources);
        self.phase = FramePhase::Idle;
        match &result {
            Ok(stats) => {
                self.frame += 1;
                tracing::debug!(?stats, "frame complete");
            }
            Err(err) => tracing::error!(%err, "frame aborted"),
        }
        result
    }

    fn run(
        &mut self,
        store: &ComponentStore,
        fallback: &dyn InteractiveCamera,
        device: &mut dyn GraphicsDevice,
        resources: &ResourceContext,
    ) -> Result<FrameStats, RenderError> {
        let solid = resources.shaders.get(SOLID_COLOR_SHADER)?;
        let flat = resources.shaders.get(FLAT_QUAD_SHADER)?;
        let lit = resources.shaders.get(LIT_SHADER)?;

        self.enter(FramePhase::BeginScene);
        let camera = self.resolver.resolve(store, fallback);
        device.begin_scene(&scene_uniforms(store, &camera));
        device.set_depth_write(true);
        device.set_blending(false);
        device.set_clear_color(self.settings.clear_color);
        device.clear();
        device.clear_id_attachment(self.settings.id_sentinel);

        self.enter(FramePhase::LinePass);
        let mut line_draws = 0;
        for (entity, line, renderer) in store.query2::<Line, LineRenderer>() {
            if line.points().len() < 2 {
                continue;
            }
            let model = store.get::<Transform>(entity)?.world_matrix();
            device.draw(&DrawCall {
                geometry: Geometry::Lines {
                    points: line.points(),
                    looped: renderer.is_looped,
                },
                model,
                color: renderer.color,
                shader: solid,
                entity: None,
            });
            line_draws += 1;
        }

        self.enter(FramePhase::OpaquePass);
        let mut opaque_draws = 0;
        for (entity, quad) in store.iter::<QuadRenderer>() {
            let model = store.get::<Transform>(entity)?.world_matrix();
            device.draw(&DrawCall {
                geometry: Geometry::Quad,
                model,
                color: quad.color,
                shader: flat,
                entity: Some(entity),
            });
            opaque_draws += 1;
        }
        for (entity, renderer) in store.iter::<MeshRenderer>() {
            if renderer.is_transparent {
                continue;
            }
            let model = store.get::<Transform>(entity)?.world_matrix();
            let mesh = mesh_of(store, entity)?;
            device.draw(&DrawCall {
                geometry: Geometry::Triangles {
                    vertices: mesh.vertices(),
                    indices: mesh.indices(),
                },
                model,
                color: renderer.color,
                shader: lit,
                entity: Some(entity),
            });
            opaque_draws += 1;
        }

        self.enter(FramePhase::TransparentPass);
        device.set_depth_write(false);
        device.set_blending(true);
        let order = self.sorter.sort(store, camera.position, lit)?;
        for item in order {
            let mesh = mesh_of(store, item.entity)?;
            let color = store.get::<MeshRenderer>(item.entity)?.color;
            device.draw(&DrawCall {
                geometry: Geometry::Triangles {
                    vertices: mesh.vertices(),
                    indices: mesh.triangle_indices(item.triangle),
                },
                model: item.model,
                color,
                shader: item.shader,
                entity: Some(item.entity),
            });
        }
        let transparent_triangles = order.len();
        device.set_depth_write(true);
        device.set_blending(false);

        self.enter(FramePhase::EndScene);
        device.end_scene();

        Ok(FrameStats {
            line_draws,
            opaque_draws,
            transparent_triangles,
            camera: camera.source,
        })
    }
}

fn scene_uniforms(store: &ComponentStore, camera: &ResolvedCamera) -> SceneUniforms {
    let mut lights: Vec<LightInfo> = store
        .query2::<Light, Transform>()
        .take(MAX_LIGHTS)
        .map(|(_, light, transform)| LightInfo {
            position: transform.translation,
            intensity: light.intensity,
        })
        .collect();
    if lights.is_empty() {
        lights.push(LightInfo::ZERO);
    }
    SceneUniforms {
        view_projection: camera.view_projection(),
        camera_position: camera.position,
        lights,
    }
}
