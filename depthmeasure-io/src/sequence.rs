//! Recorded frame sequences

use crate::error::{IoError, Result};
use crate::frame::DepthFrame;
use depthmeasure_core::{
    DepthSample, DepthSampleProvider, GrabError, Pixel, Resolution, SampleError,
};
use std::path::Path;
use tracing::debug;

/// Replays a list of frames, one per grab.
///
/// Sampling before the first grab reports [`SampleError::NoFrame`]. Once a
/// non-looping sequence is exhausted every grab reports
/// [`GrabError::EndOfStream`] and samples keep coming from the last frame,
/// which the measurement loop keeps treating as the current frame.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<DepthFrame>,
    current: Option<usize>,
    looping: bool,
}

impl FrameSequence {
    /// Build a sequence; all frames must share one resolution
    pub fn new(frames: Vec<DepthFrame>, looping: bool) -> Result<Self> {
        let first = frames.first().ok_or_else(|| IoError::InvalidFormat {
            format: "frame sequence is empty".to_string(),
        })?;
        let resolution = first.resolution();
        if let Some(odd) = frames.iter().find(|f| f.resolution() != resolution) {
            return Err(IoError::InvalidFormat {
                format: format!(
                    "frame of {}x{} in a {}x{} sequence",
                    odd.width(),
                    odd.height(),
                    resolution.width,
                    resolution.height
                ),
            });
        }
        Ok(Self {
            frames,
            current: None,
            looping,
        })
    }

    /// Load frames from files, in the given order
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], looping: bool) -> Result<Self> {
        let frames = paths
            .iter()
            .map(crate::read_frame)
            .collect::<Result<Vec<_>>>()?;
        Self::new(frames, looping)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Index of the frame samples are read from
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_frame(&self) -> Option<&DepthFrame> {
        self.current.map(|i| &self.frames[i])
    }
}

impl DepthSampleProvider for FrameSequence {
    fn resolution(&self) -> Resolution {
        self.frames[0].resolution()
    }

    fn grab(&mut self) -> std::result::Result<(), GrabError> {
        let next = match self.current {
            None => 0,
            Some(i) if i + 1 < self.frames.len() => i + 1,
            Some(_) if self.looping => 0,
            Some(_) => return Err(GrabError::EndOfStream),
        };
        debug!(frame = next, "Grabbed recorded frame");
        self.current = Some(next);
        Ok(())
    }

    fn sample_at(&self, pixel: Pixel) -> DepthSample {
        match self.current_frame() {
            Some(frame) => frame.sample_at(pixel),
            None => Err(SampleError::NoFrame),
        }
    }
}
