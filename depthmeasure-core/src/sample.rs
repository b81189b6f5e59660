//! Depth samples and the provider interface
//!
//! A depth provider maps a pixel of the current frame to a camera-space
//! point. Providers report failure as an explicit [`SampleError`] rather than
//! a status code next to a possibly garbage triple; a successful sample can
//! still carry NaN or infinite coordinates (no depth, out of range), which is
//! what the validity filter is for.

use crate::point::{Pixel, Point3f};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a provider could not produce a sample for a pixel
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleError {
    #[error("pixel {u},{v} is outside the {width}x{height} frame")]
    OutOfBounds { u: u32, v: u32, width: u32, height: u32 },

    #[error("no frame has been grabbed yet")]
    NoFrame,

    #[error("depth not available")]
    NotAvailable,

    #[error("provider error code {0}")]
    Provider(i32),
}

/// Result of querying a provider at a single pixel
pub type DepthSample = std::result::Result<Point3f, SampleError>;

/// Why a provider could not deliver a new frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrabError {
    #[error("frame not ready")]
    NotReady,

    /// No frames left; the last frame delivered stays current
    #[error("end of stream")]
    EndOfStream,

    #[error("grab failed: {0}")]
    Failed(String),
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in a frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.u < self.width && pixel.v < self.height
    }

    /// Center pixel, used as the initial cursor position
    pub fn center(&self) -> Pixel {
        Pixel::new(self.width / 2, self.height / 2)
    }
}

/// A source of depth frames that can be sampled per pixel.
///
/// `grab` advances to the next frame; `sample_at` always reads from the most
/// recently grabbed frame and blocks until it has an answer. Sampling does not
/// advance the provider, so renderers may read depth through a shared borrow.
pub trait DepthSampleProvider {
    /// Dimensions of the frames this provider produces
    fn resolution(&self) -> Resolution;

    /// Acquire the next frame
    fn grab(&mut self) -> std::result::Result<(), GrabError>;

    /// Sample the current frame at `pixel`
    fn sample_at(&self, pixel: Pixel) -> DepthSample;
}

impl<P: DepthSampleProvider + ?Sized> DepthSampleProvider for Box<P> {
    fn resolution(&self) -> Resolution {
        (**self).resolution()
    }

    fn grab(&mut self) -> std::result::Result<(), GrabError> {
        (**self).grab()
    }

    fn sample_at(&self, pixel: Pixel) -> DepthSample {
        (**self).sample_at(pixel)
    }
}
