use image::RgbImage;

use super::SourceError;

/// A decoded still image acting as a frame source.
///
/// Lives until the manager replaces it; the frame never changes after
/// decoding.
pub struct StillImage {
    frame: RgbImage,
}

impl StillImage {
    /// Decode an image from raw file bytes. The format is sniffed
    /// from the bytes themselves.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SourceError> {
        let frame = image::load_from_memory(bytes)?.to_rgb8();
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn decodes_png_bytes() {
        let still = StillImage::from_bytes(&png_bytes(320, 240)).unwrap();
        assert_eq!(still.dimensions(), (320, 240));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = StillImage::from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
