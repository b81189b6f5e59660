//! Depth to color mapping

use crate::overlay::Rgb;
use depthmeasure_core::{is_usable, DepthSample};

/// Color of pixels without usable depth
pub const NO_DEPTH_COLOR: Rgb = [0, 0, 0];

/// Maps depth linearly onto a red (near) to blue (far) ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthColormap {
    pub near: f32,
    pub far: f32,
}

impl DepthColormap {
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// Fit the ramp to the usable samples, `None` if there are none
    pub fn fit<'a, I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a DepthSample>,
    {
        samples
            .into_iter()
            .filter(|s| is_usable(s))
            .filter_map(|s| s.as_ref().ok().map(|p| p.z))
            .fold(None, |range: Option<Self>, z| match range {
                None => Some(Self::new(z, z)),
                Some(r) => Some(Self::new(r.near.min(z), r.far.max(z))),
            })
    }

    pub fn color_for_depth(&self, depth: f32) -> Rgb {
        let span = self.far - self.near;
        let t = if span > f32::EPSILON {
            ((depth - self.near) / span).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let r = 255.0 * (1.0 - t);
        let g = 255.0 * (1.0 - (2.0 * t - 1.0).abs());
        let b = 255.0 * t;
        [r.round() as u8, g.round() as u8, b.round() as u8]
    }

    pub fn color_for(&self, sample: &DepthSample) -> Rgb {
        match sample {
            Ok(point) if is_usable(sample) => self.color_for_depth(point.z),
            _ => NO_DEPTH_COLOR,
        }
    }
}
