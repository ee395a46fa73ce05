use glam::Mat4;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionType {
    #[default]
    Perspective,
    Orthographic,
}

fn default_aspect_ratio() -> f32 {
    1.0
}

/// Projection parameters of a scene camera.
///
/// The projection matrix is cached and recomputed on every parameter change.
/// After deserialization the cache is stale until `recalculate_projection`
/// runs; attaching the camera to a store does that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SceneCamera {
    projection_type: ProjectionType,
    #[serde(rename = "PerspectiveFOV")]
    perspective_fov: f32,
    perspective_near: f32,
    perspective_far: f32,
    orthographic_size: f32,
    orthographic_near: f32,
    orthographic_far: f32,
    #[serde(skip, default = "default_aspect_ratio")]
    aspect_ratio: f32,
    #[serde(skip)]
    projection: Mat4,
}

impl Default for SceneCamera {
    fn default() -> Self {
        let mut camera = Self {
            projection_type: ProjectionType::Perspective,
            perspective_fov: 45.0_f32.to_radians(),
            perspective_near: 0.01,
            perspective_far: 1000.0,
            orthographic_size: 10.0,
            orthographic_near: -1.0,
            orthographic_far: 1.0,
            aspect_ratio: 1.0,
            projection: Mat4::IDENTITY,
        };
        camera.recalculate_projection();
        camera
    }
}

impl SceneCamera {
    pub fn perspective(fov_radians: f32, near: f32, far: f32) -> Self {
        let mut camera = Self::default();
        camera.set_perspective(fov_radians, near, far);
        camera
    }

    pub fn orthographic(size: f32, near: f32, far: f32) -> Self {
        let mut camera = Self::default();
        camera.set_orthographic(size, near, far);
        camera
    }

    pub fn set_perspective(&mut self, fov_radians: f32, near: f32, far: f32) {
        self.projection_type = ProjectionType::Perspective;
        self.perspective_fov = fov_radians;
        self.perspective_near = near;
        self.perspective_far = far;
        self.recalculate_projection();
    }

    pub fn set_orthographic(&mut self, size: f32, near: f32, far: f32) {
        self.projection_type = ProjectionType::Orthographic;
        self.orthographic_size = size;
        self.orthographic_near = near;
        self.orthographic_far = far;
        self.recalculate_projection();
    }

    /// Update the aspect ratio from a viewport size. `height` must be non-zero.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        debug_assert!(height > 0, "viewport height must be clamped before reaching the camera");
        self.aspect_ratio = width as f32 / height as f32;
        self.recalculate_projection();
    }

    pub fn set_projection_type(&mut self, projection_type: ProjectionType) {
        self.projection_type = projection_type;
        self.recalculate_projection();
    }

    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn perspective_fov(&self) -> f32 {
        self.perspective_fov
    }

    pub fn perspective_near(&self) -> f32 {
        self.perspective_near
    }

    pub fn perspective_far(&self) -> f32 {
        self.perspective_far
    }

    pub fn orthographic_size(&self) -> f32 {
        self.orthographic_size
    }

    pub fn orthographic_near(&self) -> f32 {
        self.orthographic_near
    }

    pub fn orthographic_far(&self) -> f32 {
        self.orthographic_far
    }

    pub fn recalculate_projection(&mut self) {
        self.projection = match self.projection_type {
            ProjectionType::Perspective => Mat4::perspective_rh(
                self.perspective_fov,
                self.aspect_ratio,
                self.perspective_near,
                self.perspective_far,
            ),
            ProjectionType::Orthographic => {
                let half_height = self.orthographic_size * 0.5;
                let half_width = half_height * self.aspect_ratio;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.orthographic_near,
                    self.orthographic_far,
                )
            }
        };
    }
}
