//! Binary depth frame format (`.dmf`)
//!
//! Layout, all little-endian:
//! - 4 bytes magic `DMF1`
//! - u32 width, u32 height
//! - `width * height` points, each three f32 (x, y, z) in meters, row-major

use crate::error::{IoError, Result};
use crate::frame::DepthFrame;
use crate::{FrameReader, FrameWriter};
use bytemuck::{Pod, Zeroable};
use depthmeasure_core::Point3f;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Magic bytes at the start of every `.dmf` file
pub const DMF_MAGIC: [u8; 4] = *b"DMF1";

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DmfHeader {
    magic: [u8; 4],
    width: u32,
    height: u32,
}

const HEADER_SIZE: usize = std::mem::size_of::<DmfHeader>();
const POINT_SIZE: usize = std::mem::size_of::<[f32; 3]>();

/// Decode a frame from an in-memory `.dmf` buffer
pub fn decode_frame(bytes: &[u8]) -> Result<DepthFrame> {
    if bytes.len() < HEADER_SIZE {
        return Err(IoError::InvalidFormat {
            format: format!("dmf file truncated: {} bytes", bytes.len()),
        });
    }

    let header: DmfHeader = bytemuck::pod_read_unaligned(&bytes[..HEADER_SIZE]);
    if header.magic != DMF_MAGIC {
        return Err(IoError::InvalidFormat {
            format: format!("bad dmf magic {:?}", header.magic),
        });
    }
    let width = u32::from_le(header.width);
    let height = u32::from_le(header.height);

    let body = &bytes[HEADER_SIZE..];
    if body.len() % POINT_SIZE != 0 {
        return Err(IoError::InvalidFormat {
            format: format!("dmf body of {} bytes is not a whole number of points", body.len()),
        });
    }

    let points = body
        .chunks_exact(POINT_SIZE)
        .map(|chunk| {
            let [x, y, z]: [f32; 3] = bytemuck::pod_read_unaligned(chunk);
            Point3f::new(from_le(x), from_le(y), from_le(z))
        })
        .collect();

    DepthFrame::new(width, height, points)
}

/// Encode a frame into a `.dmf` buffer
pub fn encode_frame(frame: &DepthFrame) -> Vec<u8> {
    let header = DmfHeader {
        magic: DMF_MAGIC,
        width: frame.width().to_le(),
        height: frame.height().to_le(),
    };
    let raw: Vec<[f32; 3]> = frame
        .points()
        .iter()
        .map(|p| [to_le(p.x), to_le(p.y), to_le(p.z)])
        .collect();

    let mut bytes = Vec::with_capacity(HEADER_SIZE + raw.len() * POINT_SIZE);
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    bytes.extend_from_slice(bytemuck::cast_slice(&raw));
    bytes
}

fn from_le(value: f32) -> f32 {
    f32::from_bits(u32::from_le(value.to_bits()))
}

fn to_le(value: f32) -> f32 {
    f32::from_bits(value.to_bits().to_le())
}

/// Reader for `.dmf` files
pub struct DmfReader;

impl FrameReader for DmfReader {
    fn read_frame<P: AsRef<Path>>(path: P) -> Result<DepthFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let bytes = std::fs::read(path)?;
        decode_frame(&bytes)
    }
}

/// Writer for `.dmf` files
pub struct DmfWriter;

impl FrameWriter for DmfWriter {
    fn write_frame<P: AsRef<Path>>(frame: &DepthFrame, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&encode_frame(frame))?;
        writer.flush()?;
        Ok(())
    }
}
