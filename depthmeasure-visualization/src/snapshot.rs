//! Image snapshots of the measurement view
//!
//! Renders the depth view with the measurement overlay into a PNG and
//! writes the measurement itself next to it as JSON. Labels and status
//! lines use DejaVu Sans Mono, embedded from `assets/`.

use crate::colormap::DepthColormap;
use crate::overlay::{Overlay, Rgb, CROSSHAIR_SIZE, LABEL_OFFSET, MARKER_RADIUS};
use chrono::Local;
use depthmeasure_core::{DepthSample, Error, FrameSink, FrameView, Pixel, Result};
use depthmeasure_io::{timestamped_name, write_measurement_json_at};
use image::{Rgb as ImageRgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut, draw_text_mut,
};
use rusttype::{Font, Scale};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Glyph height of labels and status lines in pixels
const TEXT_SCALE: f32 = 16.0;
/// Top-left corner of the first status line
const STATUS_ORIGIN: (i32, i32) = (10, 6);
const STATUS_LINE_SPACING: i32 = 20;

fn overlay_font() -> Option<Font<'static>> {
    let font = Font::try_from_bytes(FONT_DATA);
    if font.is_none() {
        warn!("Embedded overlay font is unreadable, drawing without text");
    }
    font
}

fn to_image_color(color: Rgb) -> ImageRgb<u8> {
    ImageRgb(color)
}

fn center(pixel: Pixel) -> (f32, f32) {
    (pixel.u as f32, pixel.v as f32)
}

/// Render the depth frame behind `view` with its overlay
pub fn render_view(view: &FrameView<'_>) -> RgbImage {
    let resolution = view.depth.resolution();
    let samples: Vec<DepthSample> = (0..resolution.height)
        .flat_map(|v| (0..resolution.width).map(move |u| Pixel::new(u, v)))
        .map(|pixel| view.depth.sample_at(pixel))
        .collect();
    let colormap = DepthColormap::fit(&samples).unwrap_or(DepthColormap::new(0.0, 1.0));

    let mut image = RgbImage::new(resolution.width, resolution.height);
    for (pixel, sample) in image.pixels_mut().zip(samples.iter()) {
        *pixel = to_image_color(colormap.color_for(sample));
    }

    draw_overlay(&mut image, &Overlay::from_view(view));
    image
}

/// Draw the overlay marks onto an image
///
/// Status lines go underneath so the marks stay visible where they overlap.
pub fn draw_overlay(image: &mut RgbImage, overlay: &Overlay) {
    let font = overlay_font();
    let scale = Scale::uniform(TEXT_SCALE);

    if let Some(font) = &font {
        let (x, y) = STATUS_ORIGIN;
        for (i, line) in overlay.lines.iter().enumerate() {
            let y = y + i as i32 * STATUS_LINE_SPACING;
            draw_text_mut(image, to_image_color(line.color), x, y, scale, font, &line.text);
        }
    }

    if let Some((a, b)) = overlay.segment {
        draw_line_segment_mut(image, center(a), center(b), to_image_color(crate::overlay::SEGMENT_COLOR));
    }

    for marker in &overlay.markers {
        let (u, v) = (marker.pixel.u as i32, marker.pixel.v as i32);
        draw_filled_circle_mut(image, (u, v), MARKER_RADIUS, to_image_color(marker.color));
        draw_hollow_circle_mut(image, (u, v), MARKER_RADIUS + 1, ImageRgb([255, 255, 255]));
        if let Some(font) = &font {
            // the offset names the label's baseline corner, as text is placed by its top
            let x = u + LABEL_OFFSET.0;
            let y = v + LABEL_OFFSET.1 - TEXT_SCALE as i32;
            draw_text_mut(image, to_image_color(marker.color), x, y, scale, font, &marker.label);
        }
    }

    if let Some(crosshair) = overlay.crosshair {
        let (u, v) = center(crosshair.pixel);
        let half = CROSSHAIR_SIZE as f32 / 2.0;
        let color = to_image_color(crosshair.color);
        draw_line_segment_mut(image, (u - half, v), (u + half, v), color);
        draw_line_segment_mut(image, (u, v - half), (u, v + half), color);
    }
}

/// Saves PNG snapshots and their measurement JSON into a directory
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the PNG and JSON, returning the PNG path
    pub fn save(&self, view: &FrameView<'_>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let taken_at = Local::now();
        let path = self.dir.join(timestamped_name("screenshot", "png", taken_at));
        render_view(view)
            .save(&path)
            .map_err(|e| Error::Render(e.to_string()))?;
        write_measurement_json_at(&view.session.snapshot(), &self.dir, taken_at)?;
        info!(path = %path.display(), "Screenshot written");
        Ok(path)
    }
}

/// Frame sink that draws nothing and only writes snapshots
pub struct HeadlessSink {
    writer: SnapshotWriter,
    presented: u64,
}

impl HeadlessSink {
    pub fn new(writer: SnapshotWriter) -> Self {
        Self { writer, presented: 0 }
    }

    /// Number of frames presented so far
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl FrameSink for HeadlessSink {
    fn present(&mut self, _view: &FrameView<'_>) -> Result<()> {
        self.presented += 1;
        Ok(())
    }

    fn save_snapshot(&mut self, view: &FrameView<'_>) -> Result<PathBuf> {
        self.writer.save(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{FIRST_POINT_COLOR, SEGMENT_COLOR, VALID_CURSOR_COLOR};
    use depthmeasure_core::{CursorProbe, MeasurementSession, Point3f};
    use depthmeasure_io::DepthFrame;

    fn ramp_frame() -> DepthFrame {
        DepthFrame::from_fn(64, 48, |p| Point3f::new(0.0, 0.0, 1.0 + p.u as f32 * 0.01))
    }

    #[test]
    fn test_render_draws_markers_and_segment() {
        let frame = ramp_frame();
        let mut session = MeasurementSession::new();
        session.select(Pixel::new(10, 24), &frame);
        session.select(Pixel::new(50, 24), &frame);
        let view = FrameView {
            frame_index: 1,
            session: &session,
            cursor: None,
            depth: &frame,
        };

        let image = render_view(&view);
        assert_eq!(image.dimensions(), (64, 48));
        assert_eq!(image.get_pixel(10, 24).0, FIRST_POINT_COLOR);
        assert_eq!(image.get_pixel(30, 24).0, SEGMENT_COLOR);
    }

    #[test]
    fn test_render_missing_depth_is_black_and_crosshair_drawn() {
        let mut frame = ramp_frame();
        frame.set(Pixel::new(0, 0), Point3f::new(f32::NAN, f32::NAN, f32::NAN));
        let session = MeasurementSession::new();
        let view = FrameView {
            frame_index: 1,
            session: &session,
            cursor: Some(CursorProbe {
                pixel: Pixel::new(32, 20),
                sample: Ok(Point3f::new(0.0, 0.0, 1.32)),
                valid: true,
            }),
            depth: &frame,
        };

        let image = render_view(&view);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(36, 20).0, VALID_CURSOR_COLOR);
        assert_eq!(image.get_pixel(32, 16).0, VALID_CURSOR_COLOR);
    }

    /// Pixels inside `[x0, x1) x [y0, y1)` that are not black
    fn lit_pixels(image: &RgbImage, (x0, x1): (u32, u32), (y0, y1): (u32, u32)) -> Vec<[u8; 3]> {
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| image.get_pixel(x, y).0))
            .filter(|p| *p != [0, 0, 0])
            .collect()
    }

    #[test]
    fn test_render_draws_label_and_status_text() {
        let frame = DepthFrame::empty(160, 120);
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(40, 100), &Ok(Point3f::new(0.0, 0.0, 1.0)));
        let view = FrameView {
            frame_index: 1,
            session: &session,
            cursor: None,
            depth: &frame,
        };

        let image = render_view(&view);

        // "P1" sits up and to the right of the marker, in the marker color
        let label = lit_pixels(&image, (50, 90), (70, 94));
        assert!(!label.is_empty());
        assert!(label.iter().all(|p| p[0] == 0 && p[2] == 0 && p[1] > 0));

        // instructions are white, so blending onto black keeps channels equal
        let status = lit_pixels(&image, (10, 150), (6, 24));
        assert!(status.iter().any(|p| p[0] > 100 && p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn test_snapshot_writer_creates_files() {
        let dir = std::env::temp_dir().join("depthmeasure_snapshot_test");
        let frame = ramp_frame();
        let session = MeasurementSession::new();
        let view = FrameView {
            frame_index: 1,
            session: &session,
            cursor: None,
            depth: &frame,
        };

        let mut sink = HeadlessSink::new(SnapshotWriter::new(&dir));
        let path = sink.save_snapshot(&view).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

        // the JSON export shares the PNG's timestamp
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap();
        let json = dir.join(format!("{}.json", stem.replacen("screenshot", "measurement", 1)));
        assert!(json.exists());
        sink.present(&view).unwrap();
        assert_eq!(sink.presented(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
