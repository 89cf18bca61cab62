mod detect;
mod output;
mod render;
mod runtime;
mod source;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;

use detect::{ClassList, Detector};
use output::{FrameSink, LoopbackSink, PngSink};
use render::Canvas;
use runtime::{CancelFlag, Ticker};
use source::{FrameSourceManager, SourceOpener, WebcamOpener};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image file to annotate instead of opening the webcam
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Output path for the annotated image (image mode).
    /// Defaults to `<input-stem>_detections.png` next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input webcam device index (live mode)
    #[arg(short = 'd', long, default_value_t = 0)]
    input_device: u32,

    /// v4l2loopback device to stream annotated frames to (live mode)
    #[arg(long, default_value = "/dev/video10")]
    loopback_device: String,

    /// Dump annotated frames as numbered PNGs into this directory
    /// instead of streaming to the loopback device (live mode)
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Loopback output resolution width
    #[arg(long, default_value_t = 1280)]
    output_width: u32,

    /// Loopback output resolution height
    #[arg(long, default_value_t = 720)]
    output_height: u32,

    /// Detection cycle interval in milliseconds (live mode)
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Comma-separated detection class names, indexed by class id
    #[arg(long, default_value = "bache,persona,auto,semaforo")]
    classes: String,

    /// Path to the detection model resource.
    /// If not provided, runs in passthrough mode without detection
    #[arg(long)]
    model: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Roadwatch starting");

    if args.interval_ms == 0 {
        bail!("--interval-ms must be at least 1");
    }

    let classes = ClassList::parse(&args.classes).context("Invalid --classes list")?;
    tracing::info!("{} detection classes configured", classes.len());

    // Resolve the detection provider. A bad model path is a status
    // line, not a crash: frames still render, just without overlays.
    let detector: Option<Box<dyn Detector>> = match &args.model {
        Some(model_path) => match detect::load_detector(model_path) {
            Ok(detector) => Some(detector),
            Err(e) => {
                tracing::error!("Could not load detection model: {}", e);
                tracing::error!("Detection disabled; rendering frames without overlays");
                None
            }
        },
        None => {
            tracing::info!("No model configured, running in passthrough mode");
            None
        }
    };

    let mut manager = FrameSourceManager::new();
    let mut canvas = Canvas::new();

    match &args.image {
        Some(image_path) => {
            let output_path = args
                .output
                .clone()
                .unwrap_or_else(|| default_output_path(image_path));
            run_image(
                &mut manager,
                detector,
                &mut canvas,
                &classes,
                image_path,
                &output_path,
            )
        }
        None => {
            let mut sink: Box<dyn FrameSink> = match &args.frames_dir {
                Some(dir) => Box::new(PngSink::directory(dir)?),
                None => Box::new(LoopbackSink::new(
                    &args.loopback_device,
                    args.output_width,
                    args.output_height,
                )?),
            };

            let cancel = CancelFlag::new();
            let handler = cancel.clone();
            ctrlc::set_handler(move || handler.cancel())
                .context("Failed to set Ctrl-C handler")?;

            run_live(
                &mut manager,
                &mut WebcamOpener,
                detector,
                &mut canvas,
                &classes,
                sink.as_mut(),
                args.input_device,
                Duration::from_millis(args.interval_ms),
                cancel,
            )
        }
    }
}

/// Single-shot mode: annotate one image file and write the result.
fn run_image(
    manager: &mut FrameSourceManager,
    mut detector: Option<Box<dyn Detector>>,
    canvas: &mut Canvas,
    classes: &ClassList,
    image_path: &Path,
    output_path: &Path,
) -> Result<()> {
    manager
        .load_image_file(image_path)
        .with_context(|| format!("Failed to load image {}", image_path.display()))?;

    let frame = manager
        .current_frame()?
        .context("Image source missing after load")?;

    let cycle_start = Instant::now();
    let detections = match detector.as_mut() {
        Some(d) => d.detect(&frame).context("Detection provider failed")?,
        None => Vec::new(),
    };
    canvas.render(&frame, &detections, classes);
    let elapsed_ms = cycle_start.elapsed().as_secs_f64() * 1000.0;

    PngSink::file(output_path).present(canvas.surface())?;

    tracing::info!(
        "Detection cycle took {:.2} ms ({} detections)",
        elapsed_ms,
        detections.len()
    );
    tracing::info!("Annotated image written to {}", output_path.display());

    Ok(())
}

/// Live mode: capture, detect, and render on a fixed schedule until
/// cancelled. The camera is released on every exit path.
#[allow(clippy::too_many_arguments)]
fn run_live(
    manager: &mut FrameSourceManager,
    opener: &mut dyn SourceOpener,
    mut detector: Option<Box<dyn Detector>>,
    canvas: &mut Canvas,
    classes: &ClassList,
    sink: &mut dyn FrameSink,
    device_index: u32,
    interval: Duration,
    cancel: CancelFlag,
) -> Result<()> {
    manager
        .start_capture(opener, device_index)
        .context("Failed to start webcam capture")?;

    if let Some((width, height)) = manager.dimensions() {
        tracing::info!("Capture: {}x{}", width, height);
    }

    let mut ticker = Ticker::new(interval);
    let mut frame_count = 0u64;
    let mut total_cycle_time = Duration::ZERO;

    tracing::info!(
        "Starting live detection loop ({} ms interval)",
        interval.as_millis()
    );
    tracing::info!("Press Ctrl+C to stop");

    while !cancel.is_cancelled() {
        let skipped = ticker.wait();
        if skipped > 0 {
            tracing::debug!("Cycle overran, skipped {} tick(s)", skipped);
        }
        if cancel.is_cancelled() {
            break;
        }

        let cycle_start = Instant::now();
        let frame = match manager.current_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Frame grab failed: {}", e);
                break;
            }
        };

        let detections = match detector.as_mut() {
            Some(d) => d.detect(&frame).context("Detection provider failed")?,
            None => Vec::new(),
        };
        canvas.render(&frame, &detections, classes);
        let cycle_time = cycle_start.elapsed();
        total_cycle_time += cycle_time;

        sink.present(canvas.surface())
            .context("Failed to present frame")?;

        frame_count += 1;
        tracing::debug!(
            "Cycle {} took {:.2} ms",
            frame_count,
            cycle_time.as_secs_f64() * 1000.0
        );

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_ms = total_cycle_time.as_secs_f64() * 1000.0 / frame_count as f64;
            tracing::info!("Frame {}: avg cycle {:.2} ms", frame_count, avg_ms);
        }
    }

    manager.stop_capture();
    tracing::info!("Live detection loop stopped after {} frame(s)", frame_count);

    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    input.with_file_name(format!("{}_detections.png", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{LiveSource, SourceError};
    use image::RgbImage;

    struct FakeLive;

    impl LiveSource for FakeLive {
        fn grab_frame(&mut self) -> Result<RgbImage, SourceError> {
            Ok(RgbImage::new(64, 48))
        }

        fn dimensions(&self) -> (u32, u32) {
            (64, 48)
        }

        fn release(&mut self) {}
    }

    struct FakeOpener;

    impl SourceOpener for FakeOpener {
        fn open(&mut self, _device_index: u32) -> Result<Box<dyn LiveSource>, SourceError> {
            Ok(Box::new(FakeLive))
        }
    }

    /// Cancels the loop after a fixed number of presented frames.
    struct CountingSink {
        presented: u64,
        stop_after: u64,
        cancel: CancelFlag,
    }

    impl FrameSink for CountingSink {
        fn present(&mut self, surface: &RgbImage) -> Result<()> {
            assert_eq!(surface.dimensions(), (64, 48));
            self.presented += 1;
            if self.presented >= self.stop_after {
                self.cancel.cancel();
            }
            Ok(())
        }
    }

    #[test]
    fn live_loop_presents_frames_then_releases_camera() {
        let mut manager = FrameSourceManager::new();
        let mut canvas = Canvas::new();
        let classes = ClassList::default();
        let cancel = CancelFlag::new();
        let mut sink = CountingSink {
            presented: 0,
            stop_after: 3,
            cancel: cancel.clone(),
        };

        run_live(
            &mut manager,
            &mut FakeOpener,
            Some(Box::new(detect::StubDetector::new())),
            &mut canvas,
            &classes,
            &mut sink,
            0,
            Duration::from_millis(1),
            cancel,
        )
        .unwrap();

        assert_eq!(sink.presented, 3);
        assert!(!manager.is_capturing());
    }

    #[test]
    fn pre_cancelled_loop_renders_nothing_but_still_cleans_up() {
        let mut manager = FrameSourceManager::new();
        let mut canvas = Canvas::new();
        let classes = ClassList::default();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut sink = CountingSink {
            presented: 0,
            stop_after: u64::MAX,
            cancel: cancel.clone(),
        };

        run_live(
            &mut manager,
            &mut FakeOpener,
            None,
            &mut canvas,
            &classes,
            &mut sink,
            0,
            Duration::from_millis(1),
            cancel,
        )
        .unwrap();

        assert_eq!(sink.presented, 0);
        assert!(!manager.is_capturing());
    }

    #[test]
    fn image_mode_writes_annotated_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.png");
        let output = dir.path().join("scene_out.png");
        image::DynamicImage::ImageRgb8(RgbImage::new(640, 480))
            .save(&input)
            .unwrap();

        let mut manager = FrameSourceManager::new();
        let mut canvas = Canvas::new();
        let classes = ClassList::default();

        run_image(
            &mut manager,
            Some(Box::new(detect::StubDetector::new())),
            &mut canvas,
            &classes,
            &input,
            &output,
        )
        .unwrap();

        let annotated = image::open(&output).unwrap();
        assert_eq!((annotated.width(), annotated.height()), (640, 480));
    }

    #[test]
    fn image_mode_fails_on_missing_input() {
        let mut manager = FrameSourceManager::new();
        let mut canvas = Canvas::new();
        let classes = ClassList::default();

        let result = run_image(
            &mut manager,
            None,
            &mut canvas,
            &classes,
            Path::new("/nonexistent/scene.png"),
            Path::new("/nonexistent/out.png"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn default_output_path_uses_input_stem() {
        assert_eq!(
            default_output_path(Path::new("/tmp/photo.jpg")),
            PathBuf::from("/tmp/photo_detections.png")
        );
        assert_eq!(
            default_output_path(Path::new("scene.png")),
            PathBuf::from("scene_detections.png")
        );
    }
}
