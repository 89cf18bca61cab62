use std::path::Path;

use image::RgbImage;

use super::{LiveSource, SourceError, SourceOpener, StillImage};

/// The manager's active source. At most one at a time.
enum SourceState {
    Idle,
    Image(StillImage),
    Capturing(Box<dyn LiveSource>),
}

/// Owns the active visual input and its lifecycle.
///
/// Exactly one source is active at a time: loading an image or
/// starting a capture releases whatever was active before, and the
/// camera is always released before a new acquisition begins.
pub struct FrameSourceManager {
    state: SourceState,
}

impl FrameSourceManager {
    pub fn new() -> Self {
        Self {
            state: SourceState::Idle,
        }
    }

    /// Decode image bytes and make the result the active source.
    ///
    /// Any running capture is stopped before the decode is attempted,
    /// so a bad file still leaves the camera free. After a decode
    /// failure the manager is idle.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), SourceError> {
        self.stop_capture();
        self.state = SourceState::Idle;

        let still = StillImage::from_bytes(bytes)?;
        let (width, height) = still.dimensions();
        tracing::info!("Image source loaded ({}x{})", width, height);
        self.state = SourceState::Image(still);
        Ok(())
    }

    pub fn load_image_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SourceError> {
        self.stop_capture();

        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_image_bytes(&bytes)
    }

    /// Acquire the camera and make the live stream the active source.
    ///
    /// The previous source is released before the new open begins, so
    /// two device handles are never held at once. After an open
    /// failure the manager is idle.
    pub fn start_capture(
        &mut self,
        opener: &mut dyn SourceOpener,
        device_index: u32,
    ) -> Result<(), SourceError> {
        self.stop_capture();
        self.state = SourceState::Idle;

        let live = opener.open(device_index)?;
        let (width, height) = live.dimensions();
        tracing::info!("Capture started ({}x{})", width, height);
        self.state = SourceState::Capturing(live);
        Ok(())
    }

    /// Stop any running capture and release the device. No-op when
    /// nothing is capturing; a loaded image stays active.
    pub fn stop_capture(&mut self) {
        if !self.is_capturing() {
            return;
        }
        if let SourceState::Capturing(mut live) =
            std::mem::replace(&mut self.state, SourceState::Idle)
        {
            live.release();
            tracing::info!("Capture stopped");
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, SourceState::Capturing(_))
    }

    /// Native dimensions of the active source, if any.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match &self.state {
            SourceState::Idle => None,
            SourceState::Image(still) => Some(still.dimensions()),
            SourceState::Capturing(live) => Some(live.dimensions()),
        }
    }

    /// Current frame of the active source: the decoded still, or the
    /// next frame off the live stream. `None` when idle.
    pub fn current_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        match &mut self.state {
            SourceState::Idle => Ok(None),
            SourceState::Image(still) => Ok(Some(still.frame().clone())),
            SourceState::Capturing(live) => live.grab_frame().map(Some),
        }
    }
}

impl Default for FrameSourceManager {
    fn default() -> Self {
        Self::new()
    }
}
