mod stub;
pub mod types;

pub use stub::StubDetector;
pub use types::{ClassList, Detection};

use std::path::{Path, PathBuf};

use anyhow::Result;
use image::RgbImage;
use thiserror::Error;

/// Errors from resolving the configured model resource.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found at {0}")]
    NotFound(PathBuf),
    #[error("model path {0} is not a regular file")]
    NotAFile(PathBuf),
}

/// Trait for detection providers.
///
/// A provider turns one frame into a list of detections, in its own
/// output order. Consumers must not assume the list is deduplicated
/// or score-sorted.
pub trait Detector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>>;
}

/// Create the default detection provider for a model resource.
///
/// The configured file must exist; its contents are not interpreted.
/// Real inference backends would slot in behind [`Detector`].
pub fn load_detector<P: AsRef<Path>>(model_path: P) -> Result<Box<dyn Detector>, ModelError> {
    let path = model_path.as_ref();
    tracing::info!("Loading detection model from {}", path.display());

    if !path.exists() {
        return Err(ModelError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ModelError::NotAFile(path.to_path_buf()));
    }

    tracing::info!("Detection model loaded successfully");
    Ok(Box::new(StubDetector::new()))
}
