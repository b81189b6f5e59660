//! Depth sources and file formats for depthmeasure
//!
//! This crate provides the depth providers the measurement loop can run on
//! and the files it reads and writes:
//! - Organized depth frames and recorded frame sequences
//! - A synthetic pinhole scene for demos and tests
//! - Binary `.dmf` and text `.xyz`/`.csv` frame formats
//! - JSON export of measurements

pub mod frame;
pub mod binary;
pub mod grid_text;
pub mod sequence;
pub mod synthetic;
pub mod export;
pub mod error;

pub use error::*;
pub use frame::DepthFrame;
pub use sequence::FrameSequence;
pub use synthetic::{PinholeIntrinsics, Patch, Region, SyntheticConfig, SyntheticScene};
pub use export::{write_measurement_json, write_measurement_json_at, timestamped_name, MeasurementRecord};
pub use grid_text::Delimiter;

use std::path::Path;

/// Trait for reading depth frames from files
pub trait FrameReader {
    fn read_frame<P: AsRef<Path>>(path: P) -> Result<DepthFrame>;
}

/// Trait for writing depth frames to files
pub trait FrameWriter {
    fn write_frame<P: AsRef<Path>>(frame: &DepthFrame, path: P) -> Result<()>;
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Auto-detect format and read a depth frame
pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<DepthFrame> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("dmf") => binary::DmfReader::read_frame(path),
        Some("xyz") | Some("csv") | Some("txt") => grid_text::GridTextReader::read_frame(path),
        _ => Err(IoError::InvalidFormat {
            format: format!("Unsupported depth frame format: {:?}", path.extension()),
        }),
    }
}

/// Auto-detect format and write a depth frame
pub fn write_frame<P: AsRef<Path>>(frame: &DepthFrame, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("dmf") => binary::DmfWriter::write_frame(frame, path),
        Some("csv") => grid_text::GridTextWriter::write_frame(frame, path, Delimiter::Comma),
        Some("xyz") | Some("txt") => {
            grid_text::GridTextWriter::write_frame(frame, path, Delimiter::Space)
        }
        _ => Err(IoError::InvalidFormat {
            format: format!("Unsupported depth frame format: {:?}", path.extension()),
        }),
    }
}
