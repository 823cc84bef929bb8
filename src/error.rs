use std::path::PathBuf;

use thiserror::Error;

/// Per-tensor failure conditions. All are local to one tensor; batch export
/// reports them per name and keeps processing the rest.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("tensor `{0}` not found in checkpoint")]
    MissingTensor(String),

    #[error("invalid scale {0}: quantization requires a positive scale")]
    InvalidScale(f32),

    #[error("malformed tensor file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
