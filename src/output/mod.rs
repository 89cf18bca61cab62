mod loopback;
mod png;

pub use loopback::LoopbackSink;
pub use png::PngSink;

use anyhow::Result;
use image::RgbImage;

/// Trait for destinations that make rendered surfaces visible.
pub trait FrameSink {
    /// Present one rendered surface.
    fn present(&mut self, surface: &RgbImage) -> Result<()>;
}
