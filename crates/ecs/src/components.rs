use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::camera::SceneCamera;

/// Display name of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub tag: String,
}

impl Tag {
    pub const DEFAULT_NAME: &'static str = "UnnamedObject";

    /// Empty names fall back to [`Tag::DEFAULT_NAME`].
    pub fn new(name: &str) -> Self {
        let tag = if name.is_empty() {
            Self::DEFAULT_NAME.to_string()
        } else {
            name.to_string()
        };
        Self { tag }
    }
}

/// Camera component: projection parameters plus scene-level flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Camera {
    pub camera: SceneCamera,
    /// At most one camera should be primary; ties are resolved by the lowest entity id.
    pub primary: bool,
    /// Exempts the camera from aspect-ratio updates on viewport resize.
    pub fixed_aspect_ratio: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            camera: SceneCamera::default(),
            primary: true,
            fixed_aspect_ratio: false,
        }
    }
}

impl Camera {
    pub fn new(camera: SceneCamera, primary: bool) -> Self {
        Self {
            camera,
            primary,
            fixed_aspect_ratio: false,
        }
    }
}

/// Flat-colored unit quad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuadRenderer {
    pub color: Vec4,
}

impl Default for QuadRenderer {
    fn default() -> Self {
        Self { color: Vec4::ONE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineRenderer {
    pub color: Vec4,
    /// Draw as a closed loop instead of an open strip.
    pub is_looped: bool,
}

impl Default for LineRenderer {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            is_looped: false,
        }
    }
}

/// Renders the entity's `Mesh` or `ObjMesh` geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeshRenderer {
    pub color: Vec4,
    pub is_transparent: bool,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            is_transparent: false,
        }
    }
}

/// Point light; its position comes from the entity transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Light {
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}
