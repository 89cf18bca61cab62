use anyhow::Result;
use image::RgbImage;

use super::types::Detection;
use super::Detector;

/// Fixed-output provider standing in for a real model backend.
///
/// Emits the same three boxes for every frame, in a stable order, so
/// the source and rendering paths can be exercised end to end without
/// an inference runtime. Boxes are in frame pixel coordinates and may
/// extend past small frames; the renderer clips.
pub struct StubDetector;

impl StubDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StubDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
        Ok(vec![
            Detection::new(50.0, 50.0, 200.0, 150.0, 0.95, 0),
            Detection::new(300.0, 250.0, 500.0, 400.0, 0.88, 1),
            Detection::new(150.0, 350.0, 250.0, 450.0, 0.70, 2),
        ])
    }
}
