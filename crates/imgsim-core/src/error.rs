use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures raised by an embedding adapter for a single image.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmbedError {
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Failed to load model '{key}': {reason}")]
    ModelLoadFailure { key: String, reason: String },

    #[error("Asset root not found: {}", .0.display())]
    AssetRootMissing(PathBuf),

    #[error("Image decode failed: {0}")]
    ImageDecodeFailure(String),

    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    #[error("No embedding store for model '{0}'")]
    StoreNotFound(String),

    #[error("Registry at {} is corrupt: {reason}", .path.display())]
    RegistryCorrupt { path: PathBuf, reason: String },

    #[error("Adapter call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

impl From<EmbedError> for Error {
    fn from(e: EmbedError) -> Self {
        match e {
            EmbedError::ImageDecode(msg) => Self::ImageDecodeFailure(msg),
            EmbedError::Inference(msg) => Self::InferenceFailure(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
