use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for template library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Errors raised while reading or writing the template library.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Template library I/O failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template image {path:?} could not be read or written: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Template metadata {path:?} is not valid JSON: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid template name '{name}': names must be non-empty plain file stems")]
    InvalidName { name: String },

    #[error("Invalid confidence threshold {threshold}: must be in (0, 1]")]
    InvalidThreshold { threshold: f32 },

    #[error("Template image is empty (0x0)")]
    EmptyImage,

    #[error("Template '{name}' not found")]
    NotFound { name: String },
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}

/// Errors from minimap coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Point ({x}, {y}) lies outside the {width}x{height} minimap")]
    OutOfBounds {
        x: f64,
        y: f64,
        width: u32,
        height: u32,
    },

    #[error("Minimap rectangle is degenerate ({width}x{height})")]
    DegenerateRect { width: u32, height: u32 },
}
