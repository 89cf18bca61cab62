use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use super::{LiveSource, SourceError, SourceOpener};

/// Live webcam stream.
///
/// Holds the device exclusively from construction until release or
/// drop.
pub struct WebcamSource {
    camera: Camera,
    released: bool,
}

impl WebcamSource {
    pub fn open(device_index: u32) -> Result<Self, SourceError> {
        tracing::info!("Opening webcam {}", device_index);

        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = Camera::new(index, requested).map_err(classify_open_error)?;
        camera.open_stream().map_err(classify_open_error)?;

        tracing::info!("Webcam {} streaming", device_index);

        Ok(Self {
            camera,
            released: false,
        })
    }
}

impl LiveSource for WebcamSource {
    fn grab_frame(&mut self) -> Result<RgbImage, SourceError> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| SourceError::Stream(e.to_string()))?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| SourceError::Stream(e.to_string()))?;

        Ok(decoded)
    }

    fn dimensions(&self) -> (u32, u32) {
        let resolution = self.camera.resolution();
        (resolution.width(), resolution.height())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.camera.stop_stream() {
            Ok(()) => tracing::info!("Webcam released"),
            Err(e) => tracing::warn!("Error stopping camera stream: {}", e),
        }
    }
}

impl Drop for WebcamSource {
    fn drop(&mut self) {
        self.release();
    }
}

fn classify_open_error(err: nokhwa::NokhwaError) -> SourceError {
    classify_open_message(err.to_string())
}

/// Map a camera open failure onto the source error taxonomy.
///
/// Backends report missing devices and permission problems through
/// the same error type, so this goes by message: anything that reads
/// as an access denial is `PermissionDenied`, the rest
/// `DeviceUnavailable`.
fn classify_open_message(msg: String) -> SourceError {
    let lower = msg.to_ascii_lowercase();
    if lower.contains("denied") || lower.contains("permission") || lower.contains("eacces") {
        SourceError::PermissionDenied(msg)
    } else {
        SourceError::DeviceUnavailable(msg)
    }
}

/// Production opener backed by nokhwa.
pub struct WebcamOpener;

impl SourceOpener for WebcamOpener {
    fn open(&mut self, device_index: u32) -> Result<Box<dyn LiveSource>, SourceError> {
        Ok(Box::new(WebcamSource::open(device_index)?))
    }
}
