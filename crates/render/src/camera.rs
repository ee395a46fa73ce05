//! Camera selection and the interactive editor camera.

use easel_common::{EntityId, Transform};
use easel_ecs::{Camera, ComponentStore};
use easel_input::{InputEvent, InputState, Key, MouseButton};
use glam::{Mat4, Quat, Vec2, Vec3};

use crate::resources::EditorCameraSettings;

/// Camera driven directly by the user, used when no scene camera is primary.
pub trait InteractiveCamera {
    fn projection(&self) -> Mat4;
    fn view_matrix(&self) -> Mat4;
    fn world_position(&self) -> Vec3;
}

/// Where the frame's camera came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSource {
    Scene(EntityId),
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCamera {
    pub projection: Mat4,
    pub view: Mat4,
    pub position: Vec3,
    pub source: CameraSource,
}

impl ResolvedCamera {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Picks the authoritative camera each frame.
///
/// The first primary camera in ascending entity order wins. Several primaries
/// are tolerated and reported once per change of the primary set.
#[derive(Debug, Default)]
pub struct CameraResolver {
    last_primaries: Option<Vec<EntityId>>,
}

impl CameraResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, store: &ComponentStore, fallback: &dyn InteractiveCamera) -> ResolvedCamera {
        let primaries: Vec<(EntityId, &Transform, &Camera)> = store
            .query2::<Transform, Camera>()
            .filter(|(_, _, camera)| camera.primary)
            .collect();
        self.report(primaries.iter().map(|(e, _, _)| *e).collect());

        match primaries.first() {
            Some(&(entity, transform, camera)) => ResolvedCamera {
                projection: camera.camera.projection(),
                view: transform.world_matrix().inverse(),
                position: transform.translation,
                source: CameraSource::Scene(entity),
            },
            None => ResolvedCamera {
                projection: fallback.projection(),
                view: fallback.view_matrix(),
                position: fallback.world_position(),
                source: CameraSource::Fallback,
            },
        }
    }

    fn report(&mut self, primaries: Vec<EntityId>) {
        if self.last_primaries.as_ref() == Some(&primaries) {
            return;
        }
        match primaries.as_slice() {
            [] => tracing::debug!("no primary camera, using editor camera"),
            [only] => tracing::debug!(camera = %only, "primary camera"),
            [chosen, ..] => tracing::warn!(
                camera = %chosen,
                candidates = ?primaries,
                "several primary cameras, using the lowest entity id"
            ),
        }
        self.last_primaries = Some(primaries);
    }
}

/// Propagate a viewport size change to the scene.
///
/// Sizes are clamped to at least 1. Every camera without a fixed aspect ratio
/// gets the new aspect ratio; the size is also remembered for cameras attached
/// later. Returns the number of cameras updated.
pub fn on_viewport_resize(store: &mut ComponentStore, width: u32, height: u32) -> usize {
    let (width, height) = (width.max(1), height.max(1));
    store.set_viewport_size(width, height);
    let mut updated = 0;
    for (_, camera) in store.iter_mut::<Camera>() {
        if !camera.fixed_aspect_ratio {
            camera.camera.set_viewport_size(width, height);
            updated += 1;
        }
    }
    tracing::debug!(width, height, updated, "viewport resized");
    updated
}

const ROTATION_SPEED: f32 = 0.8;
const MOUSE_SCALE: f32 = 0.003;
const MIN_DISTANCE: f32 = 1.0;

/// Orbit camera circling a focal point.
///
/// Right drag (or Alt + left drag) orbits, middle drag pans, scrolling zooms.
#[derive(Debug, Clone)]
pub struct EditorCamera {
    pub focal_point: Vec3,
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    fov: f32,
    near: f32,
    far: f32,
    viewport: (u32, u32),
    projection: Mat4,
}

impl Default for EditorCamera {
    fn default() -> Self {
        Self::from_settings(&EditorCameraSettings::default())
    }
}

impl EditorCamera {
    pub fn from_settings(settings: &EditorCameraSettings) -> Self {
        let mut camera = Self {
            focal_point: Vec3::ZERO,
            distance: settings.distance,
            pitch: 0.0,
            yaw: 0.0,
            fov: settings.fov_degrees.to_radians(),
            near: settings.near,
            far: settings.far,
            viewport: (1280, 720),
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    fn update_projection(&mut self) {
        let aspect = self.viewport.0 as f32 / self.viewport.1 as f32;
        self.projection = Mat4::perspective_rh(self.fov, aspect, self.near, self.far);
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
        self.update_projection();
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(-self.yaw) * Quat::from_rotation_x(-self.pitch)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation() * Vec3::Y
    }

    pub fn position(&self) -> Vec3 {
        self.focal_point - self.forward() * self.distance
    }

    fn pan_speed(&self) -> Vec2 {
        let factor = |extent: u32| {
            let x = (extent as f32 / 1000.0).min(2.4);
            0.0366 * x * x - 0.1778 * x + 0.3021
        };
        Vec2::new(factor(self.viewport.0), factor(self.viewport.1))
    }

    fn zoom_speed(&self) -> f32 {
        let d = (self.distance * 0.2).max(0.0);
        (d * d).min(100.0)
    }

    pub fn pan(&mut self, delta: Vec2) {
        let speed = self.pan_speed();
        self.focal_point += -self.right() * delta.x * speed.x * self.distance;
        self.focal_point += self.up() * delta.y * speed.y * self.distance;
    }

    pub fn rotate(&mut self, delta: Vec2) {
        let yaw_sign = if self.up().y < 0.0 { -1.0 } else { 1.0 };
        self.yaw += yaw_sign * delta.x * ROTATION_SPEED;
        self.pitch += delta.y * ROTATION_SPEED;
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance -= delta * self.zoom_speed();
        if self.distance < MIN_DISTANCE {
            self.focal_point += self.forward();
            self.distance = MIN_DISTANCE;
        }
    }

    /// React to one input event. `state` must already include the event.
    /// Returns whether the camera moved or changed.
    pub fn on_event(&mut self, event: &InputEvent, state: &InputState) -> bool {
        match *event {
            InputEvent::MouseMoved { .. } => {
                let delta = state.cursor_delta() * MOUSE_SCALE;
                let orbiting = state.is_button_down(MouseButton::Right)
                    || (state.is_key_down(Key::Alt) && state.is_button_down(MouseButton::Left));
                if orbiting {
                    self.rotate(delta);
                    true
                } else if state.is_button_down(MouseButton::Middle) {
                    self.pan(delta);
                    true
                } else {
                    false
                }
            }
            InputEvent::Scrolled { delta } => {
                self.zoom(delta * 0.1);
                true
            }
            InputEvent::Resized { width, height } => {
                self.set_viewport_size(width, height);
                true
            }
            _ => false,
        }
    }
}

impl InteractiveCamera for EditorCamera {
    fn projection(&self) -> Mat4 {
        self.projection
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation(), self.position()).inverse()
    }

    fn world_position(&self) -> Vec3 {
        self.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_ecs::SceneCamera;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn camera_at(store: &mut ComponentStore, name: &str, z: f32, primary: bool) -> EntityId {
        let e = store.create_entity(name);
        store.get_mut::<Transform>(e).unwrap().translation = Vec3::new(0.0, 0.0, z);
        store
            .attach(e, Camera::new(SceneCamera::default(), primary))
            .unwrap();
        e
    }

    #[test]
    fn single_primary_is_used() {
        let mut store = ComponentStore::new();
        let e = camera_at(&mut store, "Main", 3.0, true);
        let resolved = CameraResolver::new().resolve(&store, &EditorCamera::default());
        assert_eq!(resolved.source, CameraSource::Scene(e));
        assert_eq!(resolved.position, Vec3::new(0.0, 0.0, 3.0));
        let expected = store.get::<Transform>(e).unwrap().world_matrix().inverse();
        assert_eq!(resolved.view, expected);
    }

    #[test]
    fn no_primary_falls_back_to_editor_camera() {
        let mut store = ComponentStore::new();
        camera_at(&mut store, "Secondary", 3.0, false);
        let editor = EditorCamera::default();
        let resolved = CameraResolver::new().resolve(&store, &editor);
        assert_eq!(resolved.source, CameraSource::Fallback);
        assert_eq!(resolved.projection, editor.projection());
        assert!(approx(resolved.position, Vec3::new(0.0, 0.0, 5.0)));
    }

    #[test]
    fn several_primaries_pick_lowest_id_every_frame() {
        let mut store = ComponentStore::new();
        let first = camera_at(&mut store, "A", 1.0, true);
        camera_at(&mut store, "B", 2.0, true);
        camera_at(&mut store, "C", 3.0, true);
        let mut resolver = CameraResolver::new();
        let editor = EditorCamera::default();
        for _ in 0..3 {
            assert_eq!(resolver.resolve(&store, &editor).source, CameraSource::Scene(first));
        }
    }

    #[test]
    fn resize_skips_fixed_cameras() {
        let mut store = ComponentStore::new();
        let free = camera_at(&mut store, "Free", 0.0, true);
        let fixed = store.create_entity("Fixed");
        store
            .attach(
                fixed,
                Camera {
                    fixed_aspect_ratio: true,
                    ..Camera::default()
                },
            )
            .unwrap();
        let before = store.get::<Camera>(fixed).unwrap().camera.aspect_ratio();

        assert_eq!(on_viewport_resize(&mut store, 1920, 1080), 1);
        assert_eq!(
            store.get::<Camera>(free).unwrap().camera.aspect_ratio(),
            1920.0 / 1080.0
        );
        assert_eq!(store.get::<Camera>(fixed).unwrap().camera.aspect_ratio(), before);
    }

    #[test]
    fn resize_clamps_zero_height() {
        let mut store = ComponentStore::new();
        let e = camera_at(&mut store, "Cam", 0.0, true);
        on_viewport_resize(&mut store, 640, 0);
        assert_eq!(store.viewport_size(), Some((640, 1)));
        assert_eq!(store.get::<Camera>(e).unwrap().camera.aspect_ratio(), 640.0);
    }

    #[test]
    fn editor_camera_orbits_focal_point() {
        let mut cam = EditorCamera::default();
        cam.rotate(Vec2::new(std::f32::consts::FRAC_PI_2 / ROTATION_SPEED, 0.0));
        assert!(((cam.position() - cam.focal_point).length() - cam.distance).abs() < 1e-4);
        assert!(approx(cam.forward(), Vec3::X) || approx(cam.forward(), Vec3::NEG_X));
    }

    #[test]
    fn zoom_never_goes_below_min_distance() {
        let mut cam = EditorCamera::default();
        cam.zoom(1000.0);
        assert_eq!(cam.distance, MIN_DISTANCE);
        assert!(cam.focal_point.z < 0.0);
    }

    #[test]
    fn right_drag_rotates() {
        let mut cam = EditorCamera::default();
        let mut state = InputState::new();
        let events = [
            InputEvent::MouseMoved { position: Vec2::new(10.0, 10.0) },
            InputEvent::MouseButton { button: MouseButton::Right, pressed: true },
            InputEvent::MouseMoved { position: Vec2::new(60.0, 10.0) },
        ];
        let mut moved = false;
        for event in &events {
            state.apply(event);
            moved |= cam.on_event(event, &state);
        }
        assert!(moved);
        assert!(cam.yaw > 0.0);
    }

    #[test]
    fn view_matrix_maps_focal_point_ahead() {
        let cam = EditorCamera::default();
        let p = cam.view_matrix().transform_point3(cam.focal_point);
        assert!(approx(p, Vec3::new(0.0, 0.0, -cam.distance)));
    }
}
