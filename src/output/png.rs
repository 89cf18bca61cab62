use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;

use super::FrameSink;

enum Target {
    File(PathBuf),
    Dir { dir: PathBuf, next_frame: u64 },
}

/// Writes rendered surfaces as PNG files.
pub struct PngSink {
    target: Target,
}

impl PngSink {
    /// Sink that writes one file, overwritten on every present.
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            target: Target::File(path.as_ref().to_path_buf()),
        }
    }

    /// Sink that writes numbered frames (`frame_000000.png`, ...)
    /// into `dir`, creating it if missing.
    pub fn directory<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create frames directory {}", dir.display()))?;
        Ok(Self {
            target: Target::Dir { dir, next_frame: 0 },
        })
    }
}

impl FrameSink for PngSink {
    fn present(&mut self, surface: &RgbImage) -> Result<()> {
        let path = match &mut self.target {
            Target::File(path) => path.clone(),
            Target::Dir { dir, next_frame } => {
                let path = dir.join(format!("frame_{:06}.png", next_frame));
                *next_frame += 1;
                path
            }
        };
        surface
            .save(&path)
            .with_context(|| format!("Failed to write frame to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotated.png");
        let mut sink = PngSink::file(&path);

        sink.present(&RgbImage::new(8, 8)).unwrap();
        sink.present(&RgbImage::new(16, 4)).unwrap();

        let reread = image::open(&path).unwrap();
        assert_eq!((reread.width(), reread.height()), (16, 4));
    }

    #[test]
    fn directory_sink_numbers_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames = dir.path().join("frames");
        let mut sink = PngSink::directory(&frames).unwrap();

        sink.present(&RgbImage::new(8, 8)).unwrap();
        sink.present(&RgbImage::new(8, 8)).unwrap();

        assert!(frames.join("frame_000000.png").exists());
        assert!(frames.join("frame_000001.png").exists());
    }
}
