use easel_common::{EntityId, SceneError};

/// Fatal frame errors. The frame is abandoned when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("entity {0} has a MeshRenderer but no Mesh or ObjMesh")]
    MissingGeometry(EntityId),
    #[error("shader `{0}` is not registered")]
    UnknownShader(String),
}

/// Picking readback failures. Callers treat every variant as "no entity".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PickError {
    #[error("pixel ({x}, {y}) outside {width}x{height} attachment")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("attachment {0} does not exist")]
    NoSuchAttachment(usize),
    #[error("attachment {0} is not an integer attachment")]
    NotAnIntegerAttachment(usize),
    #[error("readback failed: {0}")]
    Readback(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
