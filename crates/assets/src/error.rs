/// Errors from asset loading. All of them are recoverable: callers keep the
/// previous geometry and log a warning.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OBJ parse error on line {line}: {message}")]
    ObjParse { line: usize, message: String },
    #[error("OBJ file contains no triangles")]
    Empty,
}
