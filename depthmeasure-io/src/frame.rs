//! Organized depth frames
//!
//! A [`DepthFrame`] is a row-major grid of camera-space points, one per
//! pixel, the same layout a stereo depth camera hands out as its XYZ
//! measure. Pixels without depth hold NaN; pixels beyond the camera's range
//! hold +inf.

use crate::error::{IoError, Result};
use depthmeasure_core::{
    DepthSample, DepthSampleProvider, GrabError, Pixel, Point3f, Resolution, SampleError,
};

/// Largest frame a file may describe, 4096x4096
pub const MAX_PIXELS: usize = 4096 * 4096;

/// Whether a `width x height` frame stays within [`MAX_PIXELS`]
pub fn within_pixel_limit(width: u32, height: u32) -> bool {
    (width as usize)
        .checked_mul(height as usize)
        .map_or(false, |count| count <= MAX_PIXELS)
}

/// Coordinates stored for a pixel that has no depth
pub fn missing_point() -> Point3f {
    Point3f::new(f32::NAN, f32::NAN, f32::NAN)
}

/// A single organized point cloud
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    resolution: Resolution,
    points: Vec<Point3f>,
}

impl DepthFrame {
    /// Build a frame from row-major points
    pub fn new(width: u32, height: u32, points: Vec<Point3f>) -> Result<Self> {
        let resolution = Resolution::new(width, height);
        if points.len() != resolution.pixel_count() {
            return Err(IoError::SizeMismatch {
                expected: resolution.pixel_count(),
                found: points.len(),
            });
        }
        Ok(Self { resolution, points })
    }

    /// A frame where every pixel has no depth
    pub fn empty(width: u32, height: u32) -> Self {
        let resolution = Resolution::new(width, height);
        Self {
            resolution,
            points: vec![missing_point(); resolution.pixel_count()],
        }
    }

    /// Like [`DepthFrame::empty`] but refuses sizes above [`MAX_PIXELS`]
    pub fn blank(width: u32, height: u32) -> Result<Self> {
        if !within_pixel_limit(width, height) {
            return Err(IoError::InvalidFormat {
                format: format!("{}x{} frame exceeds {} pixels", width, height, MAX_PIXELS),
            });
        }
        Ok(Self::empty(width, height))
    }

    /// Build a frame by evaluating `f` at every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(Pixel) -> Point3f,
    {
        let resolution = Resolution::new(width, height);
        let mut points = Vec::with_capacity(resolution.pixel_count());
        for v in 0..height {
            for u in 0..width {
                points.push(f(Pixel::new(u, v)));
            }
        }
        Self { resolution, points }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    /// Row-major points
    pub fn points(&self) -> &[Point3f] {
        &self.points
    }

    fn index(&self, pixel: Pixel) -> Option<usize> {
        if self.resolution.contains(pixel) {
            Some(pixel.v as usize * self.resolution.width as usize + pixel.u as usize)
        } else {
            None
        }
    }

    /// Point stored at `pixel`, or `None` outside the frame
    pub fn get(&self, pixel: Pixel) -> Option<Point3f> {
        self.index(pixel).map(|i| self.points[i])
    }

    /// Overwrite the point at `pixel`; returns false outside the frame
    pub fn set(&mut self, pixel: Pixel, point: Point3f) -> bool {
        match self.index(pixel) {
            Some(i) => {
                self.points[i] = point;
                true
            }
            None => false,
        }
    }

    /// Fraction of pixels whose coordinates are all finite
    pub fn valid_fraction(&self) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        let valid = self.points.iter().filter(|p| is_finite(p)).count();
        valid as f32 / self.points.len() as f32
    }

    /// Smallest and largest finite depth (z) in the frame
    pub fn depth_range(&self) -> Option<(f32, f32)> {
        self.points
            .iter()
            .filter(|p| is_finite(p))
            .map(|p| p.z)
            .fold(None, |range, z| match range {
                None => Some((z, z)),
                Some((min, max)) => Some((min.min(z), max.max(z))),
            })
    }
}

fn is_finite(point: &Point3f) -> bool {
    point.x.is_finite() && point.y.is_finite() && point.z.is_finite()
}

/// A still frame acts as a provider that never changes
impl DepthSampleProvider for DepthFrame {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn grab(&mut self) -> std::result::Result<(), GrabError> {
        Ok(())
    }

    fn sample_at(&self, pixel: Pixel) -> DepthSample {
        self.get(pixel).ok_or(SampleError::OutOfBounds {
            u: pixel.u,
            v: pixel.v,
            width: self.resolution.width,
            height: self.resolution.height,
        })
    }
}
