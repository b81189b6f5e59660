//! Overlay model shared by the image and terminal renderers
//!
//! Turns a [`FrameView`] into the marks drawn over the depth image: one
//! labelled marker per selected point, a segment once two points are held,
//! a crosshair at the cursor and the text lines of the status area.

use depthmeasure_core::{feedback, FrameView, Pixel};

/// RGB color
pub type Rgb = [u8; 3];

pub const FIRST_POINT_COLOR: Rgb = [0, 255, 0];
pub const SECOND_POINT_COLOR: Rgb = [255, 0, 0];
pub const SEGMENT_COLOR: Rgb = [0, 255, 255];
pub const VALID_CURSOR_COLOR: Rgb = [0, 255, 0];
pub const INVALID_CURSOR_COLOR: Rgb = [255, 0, 0];
pub const INSTRUCTION_COLOR: Rgb = [255, 255, 255];
pub const DISTANCE_COLOR: Rgb = [255, 255, 0];
pub const FEEDBACK_COLOR: Rgb = [200, 200, 0];

/// Radius of point markers in image pixels
pub const MARKER_RADIUS: i32 = 8;
/// Size of the cursor crosshair in image pixels
pub const CROSSHAIR_SIZE: i32 = 15;
/// Offset of a marker label from its point
pub const LABEL_OFFSET: (i32, i32) = (10, -10);

/// A selected point as drawn on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub pixel: Pixel,
    pub label: String,
    pub color: Rgb,
}

/// The live cursor as drawn on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crosshair {
    pub pixel: Pixel,
    pub color: Rgb,
}

/// A line of status text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
    pub color: Rgb,
}

/// Everything drawn on top of the depth image for one frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Overlay {
    pub markers: Vec<Marker>,
    pub segment: Option<(Pixel, Pixel)>,
    pub crosshair: Option<Crosshair>,
    pub lines: Vec<TextLine>,
}

/// Color of the n-th selected point
pub fn point_color(index: usize) -> Rgb {
    if index == 0 {
        FIRST_POINT_COLOR
    } else {
        SECOND_POINT_COLOR
    }
}

impl Overlay {
    pub fn from_view(view: &FrameView<'_>) -> Self {
        let points = view.session.points();
        let markers = points
            .iter()
            .enumerate()
            .map(|(i, point)| Marker {
                pixel: point.pixel(),
                label: format!("P{}", i + 1),
                color: point_color(i),
            })
            .collect();

        let segment = match points {
            [a, b] => Some((a.pixel(), b.pixel())),
            _ => None,
        };

        let crosshair = view.cursor.map(|probe| Crosshair {
            pixel: probe.pixel,
            color: if probe.valid {
                VALID_CURSOR_COLOR
            } else {
                INVALID_CURSOR_COLOR
            },
        });

        let mut lines = vec![TextLine {
            text: feedback::instructions().to_string(),
            color: INSTRUCTION_COLOR,
        }];
        if let Some(text) = view.distance_line() {
            lines.push(TextLine { text, color: DISTANCE_COLOR });
        }
        let status = view.status();
        if !status.is_empty() {
            lines.push(TextLine { text: status, color: FEEDBACK_COLOR });
        }

        Self {
            markers,
            segment,
            crosshair,
            lines,
        }
    }
}
