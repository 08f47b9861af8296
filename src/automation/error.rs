use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing minimap calibration.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("Anchor image {path:?} could not be loaded: {source}")]
    AnchorLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Anchor image '{name}' is empty")]
    EmptyAnchor { name: &'static str },
}
