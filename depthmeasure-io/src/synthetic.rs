//! Synthetic depth scenes
//!
//! A pinhole camera looking at a fronto-parallel back plane, optionally with
//! closer rectangular patches and holes with no depth. Useful for demos,
//! replay scripts and tests that need a predictable provider.

use crate::frame::DepthFrame;
use depthmeasure_core::{
    DepthSample, DepthSampleProvider, GrabError, Pixel, Point3f, Resolution, SampleError,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pinhole intrinsics in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinholeIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl PinholeIntrinsics {
    /// Back-project a pixel at the given depth into camera space
    pub fn unproject(&self, pixel: Pixel, depth: f32) -> Point3f {
        let x = (pixel.u as f32 - self.cx) * depth / self.fx;
        let y = (pixel.v as f32 - self.cy) * depth / self.fy;
        Point3f::new(x, y, depth)
    }

    /// Project a camera-space point to image coordinates
    pub fn project(&self, point: &Point3f) -> Option<(f32, f32)> {
        if point.z <= 0.0 {
            return None;
        }
        Some((
            point.x * self.fx / point.z + self.cx,
            point.y * self.fy / point.z + self.cy,
        ))
    }
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub u: u32,
    pub v: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.u >= self.u
            && pixel.v >= self.v
            && pixel.u - self.u < self.width
            && pixel.v - self.v < self.height
    }
}

/// A rectangle of the image that sits at its own depth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub region: Region,
    pub depth: f32,
}

/// Description of a synthetic scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    pub focal_length: f32,
    /// Depth of the back plane, meters
    pub plane_depth: f32,
    pub patches: Vec<Patch>,
    pub holes: Vec<Region>,
    /// Uniform depth noise amplitude, meters
    pub noise: f32,
    /// Depth beyond which samples read as infinitely far
    pub max_depth: f32,
    pub seed: u64,
    /// Fail every n-th grab, simulating a flaky camera link
    pub drop_every: Option<u32>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            focal_length: 700.0,
            plane_depth: 2.0,
            patches: vec![Patch {
                region: Region { u: 480, v: 260, width: 320, height: 200 },
                depth: 1.2,
            }],
            holes: vec![Region { u: 100, v: 100, width: 80, height: 60 }],
            noise: 0.0,
            max_depth: 10.0,
            seed: 7,
            drop_every: None,
        }
    }
}

impl SyntheticConfig {
    pub fn intrinsics(&self) -> PinholeIntrinsics {
        PinholeIntrinsics {
            fx: self.focal_length,
            fy: self.focal_length,
            cx: self.width as f32 / 2.0,
            cy: self.height as f32 / 2.0,
        }
    }

    /// Noise-free depth at a pixel, `None` inside a hole
    pub fn depth_at(&self, pixel: Pixel) -> Option<f32> {
        if self.holes.iter().any(|hole| hole.contains(pixel)) {
            return None;
        }
        let depth = self
            .patches
            .iter()
            .rev()
            .find(|patch| patch.region.contains(pixel))
            .map(|patch| patch.depth)
            .unwrap_or(self.plane_depth);
        Some(depth)
    }
}

/// Provider that renders a [`SyntheticConfig`] into a fresh frame per grab
#[derive(Debug)]
pub struct SyntheticScene {
    config: SyntheticConfig,
    rng: StdRng,
    frame: Option<DepthFrame>,
    grabs: u64,
}

impl SyntheticScene {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            frame: None,
            grabs: 0,
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Render one frame with the scene's noise
    pub fn render_frame(&mut self) -> DepthFrame {
        let config = &self.config;
        let intrinsics = config.intrinsics();
        let rng = &mut self.rng;
        DepthFrame::from_fn(config.width, config.height, |pixel| {
            match config.depth_at(pixel) {
                None => crate::frame::missing_point(),
                Some(depth) => {
                    let noisy = if config.noise > 0.0 {
                        depth + rng.gen_range(-config.noise..=config.noise)
                    } else {
                        depth
                    };
                    if noisy > config.max_depth {
                        Point3f::new(0.0, 0.0, f32::INFINITY)
                    } else {
                        intrinsics.unproject(pixel, noisy)
                    }
                }
            }
        })
    }
}

impl DepthSampleProvider for SyntheticScene {
    fn resolution(&self) -> Resolution {
        Resolution::new(self.config.width, self.config.height)
    }

    fn grab(&mut self) -> std::result::Result<(), GrabError> {
        self.grabs += 1;
        if let Some(every) = self.config.drop_every {
            if every > 0 && self.grabs % u64::from(every) == 0 {
                debug!(grab = self.grabs, "Synthetic grab dropped");
                return Err(GrabError::NotReady);
            }
        }
        self.frame = Some(self.render_frame());
        Ok(())
    }

    fn sample_at(&self, pixel: Pixel) -> DepthSample {
        match &self.frame {
            Some(frame) => frame.sample_at(pixel),
            None => Err(SampleError::NoFrame),
        }
    }
}
