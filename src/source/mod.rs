mod manager;
mod still;
mod webcam;

pub use manager::FrameSourceManager;
pub use still::StillImage;
pub use webcam::{WebcamOpener, WebcamSource};

use std::path::PathBuf;

use image::RgbImage;
use thiserror::Error;

/// Errors from acquiring or reading a frame source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The provided bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The platform refused camera access.
    #[error("camera access denied: {0}")]
    PermissionDenied(String),

    /// No usable camera behind the requested index.
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The open stream failed to deliver a frame.
    #[error("camera stream error: {0}")]
    Stream(String),
}

/// A live frame source with an explicit release lifecycle.
///
/// `release` must be idempotent. Implementations also release in
/// `Drop`, so the device is freed on every exit path.
pub trait LiveSource {
    /// Grab the next frame from the stream.
    fn grab_frame(&mut self) -> Result<RgbImage, SourceError>;

    /// Native resolution of delivered frames.
    fn dimensions(&self) -> (u32, u32);

    /// Release the underlying device.
    fn release(&mut self);
}

/// Opens live sources.
///
/// Seam between [`FrameSourceManager`] and the camera backend;
/// production code uses [`WebcamOpener`].
pub trait SourceOpener {
    fn open(&mut self, device_index: u32) -> Result<Box<dyn LiveSource>, SourceError>;
}
