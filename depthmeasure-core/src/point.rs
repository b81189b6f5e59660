//! Point types and related functionality

use crate::filter::AcceptedSample;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 3D point with floating point coordinates, in meters
pub type Point3f = Point3<f32>;

/// An image coordinate in the depth stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pixel {
    pub u: u32,
    pub v: u32,
}

impl Pixel {
    pub fn new(u: u32, v: u32) -> Self {
        Self { u, v }
    }

    /// Shift the pixel by a signed offset, clamped to `[0, width) x [0, height)`
    pub fn offset_clamped(self, du: i64, dv: i64, width: u32, height: u32) -> Self {
        let clamp = |value: u32, delta: i64, limit: u32| -> u32 {
            let max = i64::from(limit.saturating_sub(1));
            (i64::from(value) + delta).clamp(0, max) as u32
        };
        Self {
            u: clamp(self.u, du, width),
            v: clamp(self.v, dv, height),
        }
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.u, self.v)
    }
}

/// One accepted measurement anchor.
///
/// The only way to build a `Point3D` is from an [`AcceptedSample`], which the
/// validity filter hands out for finite coordinates only. Points are never
/// mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3D {
    pixel: Pixel,
    world: Point3f,
}

impl Point3D {
    /// Anchor an accepted sample at the pixel it was taken from
    pub fn new(pixel: Pixel, sample: AcceptedSample) -> Self {
        Self {
            pixel,
            world: sample.into_world(),
        }
    }

    /// Source image coordinate, used for overlay rendering only
    pub fn pixel(&self) -> Pixel {
        self.pixel
    }

    /// Camera-space position in meters
    pub fn world(&self) -> Point3f {
        self.world
    }
}
