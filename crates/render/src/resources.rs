use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, SettingsError};

/// Flat color, no lighting. Used by the line pass.
pub const SOLID_COLOR_SHADER: &str = "SolidColor";
/// Flat color with id output. Used for quads.
pub const FLAT_QUAD_SHADER: &str = "FlatQuad";
/// Diffuse lighting from the scene lights. Used for meshes.
pub const LIT_SHADER: &str = "Lit";

/// Index of a registered shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderHandle(pub usize);

/// Named shader programs known to the backends.
///
/// Programs are identified by name only; each backend maps the handle to its
/// own compiled program.
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    names: Vec<String>,
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        let mut library = Self::empty();
        for name in [SOLID_COLOR_SHADER, FLAT_QUAD_SHADER, LIT_SHADER] {
            library.register(name);
        }
        library
    }
}

impl ShaderLibrary {
    pub fn empty() -> Self {
        Self { names: Vec::new() }
    }

    /// Register a program, returning the existing handle if the name is taken.
    pub fn register(&mut self, name: &str) -> ShaderHandle {
        if let Some(handle) = self.find(name) {
            return handle;
        }
        self.names.push(name.to_string());
        ShaderHandle(self.names.len() - 1)
    }

    pub fn find(&self, name: &str) -> Option<ShaderHandle> {
        self.names.iter().position(|n| n == name).map(ShaderHandle)
    }

    pub fn get(&self, name: &str) -> Result<ShaderHandle, RenderError> {
        self.find(name)
            .ok_or_else(|| RenderError::UnknownShader(name.to_string()))
    }

    pub fn name(&self, handle: ShaderHandle) -> Option<&str> {
        self.names.get(handle.0).map(String::as_str)
    }
}

/// Resources shared by every frame. Owned by the host and passed to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ResourceContext {
    pub shaders: ShaderLibrary,
}

/// Defaults for the interactive editor camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorCameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
}

impl Default for EditorCameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            distance: 5.0,
        }
    }
}

/// Renderer configuration, loadable from YAML. Missing keys keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub clear_color: Vec4,
    /// Value the id attachment is cleared to; read back as "no entity".
    pub id_sentinel: i32,
    pub editor_camera: EditorCameraSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: Vec4::new(0.1, 0.1, 0.1, 1.0),
            id_sentinel: -1,
            editor_camera: EditorCameraSettings::default(),
        }
    }
}

impl RenderSettings {
    pub fn from_yaml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shaders_are_registered() {
        let library = ShaderLibrary::default();
        let lit = library.get(LIT_SHADER).unwrap();
        assert_eq!(library.name(lit), Some(LIT_SHADER));
        assert!(library.get(SOLID_COLOR_SHADER).is_ok());
        assert!(library.get(FLAT_QUAD_SHADER).is_ok());
    }

    #[test]
    fn unknown_shader_is_an_error() {
        let err = ShaderLibrary::empty().get("Phong").unwrap_err();
        assert!(matches!(err, RenderError::UnknownShader(name) if name == "Phong"));
    }

    #[test]
    fn register_is_idempotent() {
        let mut library = ShaderLibrary::empty();
        let a = library.register("Custom");
        assert_eq!(library.register("Custom"), a);
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let settings = RenderSettings::from_yaml_str("id_sentinel: -7\n").unwrap();
        assert_eq!(settings.id_sentinel, -7);
        assert_eq!(settings.clear_color, RenderSettings::default().clear_color);
        assert_eq!(settings.editor_camera.distance, 5.0);
    }

    #[test]
    fn settings_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.yaml");
        std::fs::write(&path, "editor_camera:\n  fov_degrees: 60.0\n").unwrap();
        let settings = RenderSettings::load(&path).unwrap();
        assert_eq!(settings.editor_camera.fov_degrees, 60.0);
        assert_eq!(settings.editor_camera.near, 0.1);
    }

    #[test]
    fn missing_settings_file_is_io_error() {
        let err = RenderSettings::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
