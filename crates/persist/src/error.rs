use easel_common::SceneError;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("entity {entity}: invalid mesh: {message}")]
    InvalidMesh { entity: String, message: String },
}
