mod font;

use image::{Rgb, RgbImage};

use crate::detect::{ClassList, Detection};

/// Box and label-background color, the demo's accent red (#E30613).
const BOX_COLOR: Rgb<u8> = Rgb([0xE3, 0x06, 0x13]);
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const STROKE_WIDTH: i32 = 2;
/// Height of the filled strip painted above each box.
const LABEL_HEIGHT: i32 = 20;
const LABEL_PAD_X: i32 = 5;
const TEXT_SCALE: u32 = 2;

/// Label fragment for one detection, percent score with one decimal:
/// `"persona (95.5%)"`.
pub fn format_label(name: &str, score: f32) -> String {
    format!("{} ({:.1}%)", name, score * 100.0)
}

/// Drawing surface for frames plus detection overlays.
///
/// The surface is recreated at the source frame's exact dimensions on
/// every render call; nothing survives from a previous,
/// differently-sized source.
pub struct Canvas {
    surface: RgbImage,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            surface: RgbImage::new(0, 0),
        }
    }

    /// Paint `frame` and its detection overlays onto the surface.
    ///
    /// Detections are drawn in input order, no reordering, no
    /// deduplication. A detection whose `class_id` is out of range
    /// for `classes` is skipped with a warning; the rest still
    /// render. Strokes and labels are clipped at the surface edges,
    /// so degenerate or out-of-bounds boxes draw without panicking.
    pub fn render(&mut self, frame: &RgbImage, detections: &[Detection], classes: &ClassList) {
        self.surface = frame.clone();

        for detection in detections {
            let Some(name) = classes.get(detection.class_id) else {
                tracing::warn!(
                    "Skipping detection with out-of-range class id {} ({} classes configured)",
                    detection.class_id,
                    classes.len()
                );
                continue;
            };
            self.draw_box(detection);
            self.draw_label(detection, name);
        }
    }

    /// The rendered surface from the latest call.
    pub fn surface(&self) -> &RgbImage {
        &self.surface
    }

    fn draw_box(&mut self, d: &Detection) {
        let x1 = d.x1.min(d.x2).round() as i32;
        let x2 = d.x1.max(d.x2).round() as i32;
        let y1 = d.y1.min(d.y2).round() as i32;
        let y2 = d.y1.max(d.y2).round() as i32;

        for inset in 0..STROKE_WIDTH {
            hollow_rect(
                &mut self.surface,
                x1 + inset,
                y1 + inset,
                x2 - inset,
                y2 - inset,
                BOX_COLOR,
            );
        }
    }

    fn draw_label(&mut self, d: &Detection, name: &str) {
        let text = format_label(name, d.score);
        let x1 = d.x1.min(d.x2).round() as i32;
        let y1 = d.y1.min(d.y2).round() as i32;

        let bg_top = y1 - LABEL_HEIGHT;
        let bg_width = font::text_width(&text, TEXT_SCALE) as i32 + 2 * LABEL_PAD_X;
        fill_rect(
            &mut self.surface,
            x1,
            bg_top,
            x1 + bg_width - 1,
            y1 - 1,
            BOX_COLOR,
        );

        let text_top = bg_top + (LABEL_HEIGHT - font::text_height(TEXT_SCALE) as i32) / 2;
        font::draw_text(
            &mut self.surface,
            &text,
            x1 + LABEL_PAD_X,
            text_top,
            TEXT_SCALE,
            LABEL_TEXT_COLOR,
        );
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

fn hollow_rect(img: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>) {
    if x2 < x1 || y2 < y1 {
        return;
    }
    for x in x1..=x2 {
        put_pixel_clipped(img, x, y1, color);
        put_pixel_clipped(img, x, y2, color);
    }
    for y in y1..=y2 {
        put_pixel_clipped(img, x1, y, color);
        put_pixel_clipped(img, x2, y, color);
    }
}

fn fill_rect(img: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>) {
    let x_start = x1.max(0);
    let y_start = y1.max(0);
    let x_end = x2.min(img.width() as i32 - 1);
    let y_end = y2.min(img.height() as i32 - 1);
    for y in y_start..=y_end {
        for x in x_start..=x_end {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn put_pixel_clipped(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, color);
    }
}
