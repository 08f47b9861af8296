use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for frame capture.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// The error type for frame sources and window lookup.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screen capture failed: {description}")]
    CaptureFailed { description: String },

    #[error("No monitor covers screen position ({x}, {y})")]
    NoMonitor { x: i32, y: i32 },

    #[error("Capture region {width}x{height} at ({x}, {y}) does not overlap the source")]
    RegionOutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    #[error("Failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to save image {path:?}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Frame source has no frames")]
    Empty,

    #[error("Live screen capture is unavailable: built without the `screen-capture` feature")]
    Unsupported,
}

impl CaptureError {
    /// Failures worth retrying after a short delay, as opposed to configuration mistakes
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CaptureError::CaptureFailed { .. } | CaptureError::NoMonitor { .. }
        )
    }
}
