use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;
use v4l::video::Output;
use v4l::{Device, Format, FourCC};

use super::FrameSink;

/// Streams rendered surfaces to a v4l2loopback device so the live
/// overlay can be watched with any webcam viewer.
pub struct LoopbackSink {
    file: File,
    // Held open so the negotiated format stays pinned on the device.
    _device: Device,
    width: u32,
    height: u32,
}

impl LoopbackSink {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        let device = Device::with_path(path)
            .with_context(|| format!("Failed to open v4l2 device at {}", path.display()))?;
        let format = Format::new(width, height, FourCC::new(b"YUYV"));
        Output::set_format(&device, &format)
            .context("Failed to set YUYV output format on loopback device")?;

        // Frame data goes through a plain write handle; v4l2loopback
        // accepts raw frames written to the device file.
        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open {} for writing", path.display()))?;

        tracing::info!("v4l2loopback sink ready");

        Ok(Self {
            file,
            _device: device,
            width,
            height,
        })
    }
}

impl FrameSink for LoopbackSink {
    fn present(&mut self, surface: &RgbImage) -> Result<()> {
        let data = if surface.dimensions() == (self.width, self.height) {
            encode_yuyv(surface)
        } else {
            let resized = image::imageops::resize(
                surface,
                self.width,
                self.height,
                image::imageops::FilterType::Lanczos3,
            );
            encode_yuyv(&resized)
        };

        self.file
            .write_all(&data)
            .context("Failed to write frame to v4l2loopback device")
    }
}

/// Pack an RGB frame into YUYV 4:2:2, one quad per pixel pair with U
/// and V averaged over the pair. An odd trailing pixel pairs with
/// itself.
fn encode_yuyv(frame: &RgbImage) -> Vec<u8> {
    let (width, height) = frame.dimensions();
    let mut out = Vec::with_capacity((width * height * 2) as usize);
    let stride = width as usize * 3;

    for row in frame.as_raw().chunks_exact(stride) {
        let mut pixels = row.chunks_exact(3);
        while let Some(first) = pixels.next() {
            let second = pixels.next().unwrap_or(first);
            let (y0, u0, v0) = rgb_to_yuv(first[0], first[1], first[2]);
            let (y1, u1, v1) = rgb_to_yuv(second[0], second[1], second[2]);
            out.push(y0);
            out.push(((u0 as u16 + u1 as u16) / 2) as u8);
            out.push(y1);
            out.push(((v0 as u16 + v1 as u16) / 2) as u8);
        }
    }

    out
}

fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;

    let y = (0.299 * r + 0.587 * g + 0.114 * b).clamp(0.0, 255.0) as u8;
    let u = ((-0.147 * r - 0.289 * g + 0.436 * b) + 128.0).clamp(0.0, 255.0) as u8;
    let v = ((0.615 * r - 0.515 * g - 0.100 * b) + 128.0).clamp(0.0, 255.0) as u8;

    (y, u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn black_maps_to_zero_luma_neutral_chroma() {
        assert_eq!(rgb_to_yuv(0, 0, 0), (0, 128, 128));
    }

    #[test]
    fn white_maps_to_full_luma_neutral_chroma() {
        let (y, u, v) = rgb_to_yuv(255, 255, 255);
        assert!(y >= 254);
        assert!((127..=129).contains(&u));
        assert!((127..=129).contains(&v));
    }

    #[test]
    fn pure_red_saturates_v() {
        let (y, u, v) = rgb_to_yuv(255, 0, 0);
        assert!((75..=77).contains(&y));
        assert!((90..=91).contains(&u));
        assert_eq!(v, 255);
    }

    #[test]
    fn encode_packs_two_bytes_per_pixel() {
        let frame = RgbImage::from_pixel(6, 4, Rgb([10, 20, 30]));
        let data = encode_yuyv(&frame);
        assert_eq!(data.len(), 6 * 4 * 2);
    }

    #[test]
    fn uniform_frame_packs_uniform_quads() {
        let frame = RgbImage::from_pixel(4, 1, Rgb([0, 0, 0]));
        let data = encode_yuyv(&frame);
        assert_eq!(data, vec![0, 128, 0, 128, 0, 128, 0, 128]);
    }
}
