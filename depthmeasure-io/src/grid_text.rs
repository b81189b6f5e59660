//! Text depth grid format (`.xyz` / `.csv`)
//!
//! Each data row gives one pixel: `u v x y z`. Supported features:
//! - Auto-detection of delimiters (comma, space, tab, semicolon)
//! - Optional header row naming the columns in any order
//! - `#` comment lines, and a `# size W H` directive fixing the frame size
//! - Pixels that are not listed have no depth (NaN)

use crate::error::{IoError, Result};
use crate::frame::{missing_point, within_pixel_limit, DepthFrame, MAX_PIXELS};
use crate::FrameReader;
use depthmeasure_core::{Pixel, Point3f};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Supported delimiters for grid files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Space,
    Tab,
    Semicolon,
}

impl Delimiter {
    /// Get the character representation of the delimiter
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Space => ' ',
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
        }
    }

    /// Detect delimiter from a line of text
    ///
    /// Spaces only count as the delimiter when no comma, semicolon or tab
    /// appears, so `0, 0, 1.5` is read as comma separated.
    pub fn detect_from_line(line: &str) -> Option<Self> {
        let mut best: Option<(usize, Delimiter)> = None;
        for delimiter in [Delimiter::Comma, Delimiter::Semicolon, Delimiter::Tab] {
            let count = line.matches(delimiter.as_char()).count();
            if count > best.map_or(0, |(most, _)| most) {
                best = Some((count, delimiter));
            }
        }

        best.map(|(_, delimiter)| delimiter)
            .or_else(|| line.contains(' ').then_some(Delimiter::Space))
    }

    fn split<'a>(&self, line: &'a str) -> impl Iterator<Item = &'a str> {
        let delimiter = *self;
        line.split(self.as_char())
            .map(str::trim)
            .filter(move |part| delimiter != Delimiter::Space || !part.is_empty())
    }
}

/// Column types that can appear in a grid file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    U,
    V,
    X,
    Y,
    Z,
    Unknown,
}

impl ColumnType {
    /// Parse column type from header name
    pub fn from_header(header: &str) -> Self {
        match header.trim().to_lowercase().as_str() {
            "u" | "col" | "column" | "px_u" => ColumnType::U,
            "v" | "row" | "px_v" => ColumnType::V,
            "x" | "pos_x" | "position_x" => ColumnType::X,
            "y" | "pos_y" | "position_y" => ColumnType::Y,
            "z" | "pos_z" | "position_z" | "depth" => ColumnType::Z,
            _ => ColumnType::Unknown,
        }
    }
}

/// Column positions of the five required fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    u: usize,
    v: usize,
    x: usize,
    y: usize,
    z: usize,
}

impl Layout {
    const DEFAULT: Layout = Layout { u: 0, v: 1, x: 2, y: 3, z: 4 };

    fn from_columns(columns: &[ColumnType], line: usize) -> Result<Self> {
        let find = |wanted: ColumnType, name: &str| {
            columns
                .iter()
                .position(|c| *c == wanted)
                .ok_or_else(|| IoError::ParseError {
                    line,
                    message: format!("header has no {} column", name),
                })
        };
        Ok(Layout {
            u: find(ColumnType::U, "u")?,
            v: find(ColumnType::V, "v")?,
            x: find(ColumnType::X, "x")?,
            y: find(ColumnType::Y, "y")?,
            z: find(ColumnType::Z, "z")?,
        })
    }

    fn max_index(&self) -> usize {
        self.u.max(self.v).max(self.x).max(self.y).max(self.z)
    }
}

fn is_header_line(parts: &[&str]) -> bool {
    parts.iter().any(|part| part.parse::<f32>().is_err())
}

fn parse_size_directive(comment: &str, line: usize) -> Result<Option<(u32, u32)>> {
    let mut words = comment.split_whitespace();
    if words.next() != Some("size") {
        return Ok(None);
    }
    let mut dimension = |name: &str| -> Result<u32> {
        words
            .next()
            .and_then(|w| w.parse().ok())
            .ok_or_else(|| IoError::ParseError {
                line,
                message: format!("size directive is missing a valid {}", name),
            })
    };
    let width = dimension("width")?;
    let height = dimension("height")?;
    if !within_pixel_limit(width, height) {
        return Err(IoError::ParseError {
            line,
            message: format!("size {}x{} exceeds {} pixels", width, height, MAX_PIXELS),
        });
    }
    Ok(Some((width, height)))
}

/// Parse a grid from any buffered reader
pub fn parse_grid<R: BufRead>(reader: R) -> Result<DepthFrame> {
    let mut size: Option<(u32, u32)> = None;
    let mut delimiter: Option<Delimiter> = None;
    let mut layout: Option<Layout> = None;
    let mut samples: Vec<Row> = Vec::new();

    for (index, line_result) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix('#') {
            if let Some(found) = parse_size_directive(comment, line_no)? {
                size = Some(found);
            }
            continue;
        }

        let delim = match delimiter {
            Some(d) => d,
            None => {
                let d = Delimiter::detect_from_line(trimmed).ok_or_else(|| IoError::ParseError {
                    line: line_no,
                    message: "could not detect delimiter".to_string(),
                })?;
                delimiter = Some(d);
                d
            }
        };
        let parts: Vec<&str> = delim.split(trimmed).collect();

        if layout.is_none() {
            if is_header_line(&parts) {
                let columns: Vec<ColumnType> =
                    parts.iter().map(|h| ColumnType::from_header(h)).collect();
                layout = Some(Layout::from_columns(&columns, line_no)?);
                continue;
            }
            layout = Some(Layout::DEFAULT);
        }
        let columns = layout.unwrap_or(Layout::DEFAULT);
        samples.push(parse_row(&parts, &columns, line_no)?);
    }

    let (width, height) = match size {
        Some(size) => size,
        None => inferred_size(&samples)?,
    };

    let mut frame = DepthFrame::blank(width, height)?;
    for row in samples {
        if !frame.set(row.pixel, row.point) {
            return Err(IoError::ParseError {
                line: row.line,
                message: format!("pixel {} lies outside the {}x{} frame", row.pixel, width, height),
            });
        }
    }
    Ok(frame)
}

/// One data row and the line it came from
struct Row {
    line: usize,
    pixel: Pixel,
    point: Point3f,
}

/// Smallest frame holding every listed pixel
fn inferred_size(samples: &[Row]) -> Result<(u32, u32)> {
    samples.iter().try_fold((0, 0), |(w, h), row| {
        let (u, v) = row
            .pixel
            .u
            .checked_add(1)
            .zip(row.pixel.v.checked_add(1))
            .ok_or_else(|| IoError::ParseError {
                line: row.line,
                message: format!("pixel {} is beyond any frame size", row.pixel),
            })?;
        Ok((w.max(u), h.max(v)))
    })
}

fn parse_row(parts: &[&str], layout: &Layout, line: usize) -> Result<Row> {
    if parts.len() <= layout.max_index() {
        return Err(IoError::ParseError {
            line,
            message: format!("expected at least {} fields, found {}", layout.max_index() + 1, parts.len()),
        });
    }

    let coordinate = |i: usize| -> Result<u32> {
        parts[i].parse::<u32>().map_err(|_| IoError::ParseError {
            line,
            message: format!("invalid pixel coordinate '{}'", parts[i]),
        })
    };
    let value = |i: usize| -> Result<f32> {
        parts[i].parse::<f32>().map_err(|_| IoError::ParseError {
            line,
            message: format!("invalid coordinate value '{}'", parts[i]),
        })
    };

    Ok(Row {
        line,
        pixel: Pixel::new(coordinate(layout.u)?, coordinate(layout.v)?),
        point: Point3f::new(value(layout.x)?, value(layout.y)?, value(layout.z)?),
    })
}

/// Reader for text grid files
pub struct GridTextReader;

impl FrameReader for GridTextReader {
    fn read_frame<P: AsRef<Path>>(path: P) -> Result<DepthFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let file = File::open(path)?;
        parse_grid(BufReader::new(file))
    }
}

/// Writer for text grid files
pub struct GridTextWriter;

impl GridTextWriter {
    /// Write every pixel that has depth; missing pixels are left out
    pub fn write_frame<P: AsRef<Path>>(frame: &DepthFrame, path: P, delimiter: Delimiter) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(frame, &mut writer, delimiter)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(frame: &DepthFrame, writer: &mut W, delimiter: Delimiter) -> Result<()> {
        let d = delimiter.as_char();
        writeln!(writer, "# size {} {}", frame.width(), frame.height())?;
        writeln!(writer, "u{d}v{d}x{d}y{d}z")?;
        let missing = missing_point();
        for v in 0..frame.height() {
            for u in 0..frame.width() {
                let point = frame.get(Pixel::new(u, v)).unwrap_or(missing);
                if point.x.is_nan() && point.y.is_nan() && point.z.is_nan() {
                    continue;
                }
                writeln!(writer, "{u}{d}{v}{d}{}{d}{}{d}{}", point.x, point.y, point.z)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_delimiter_detection() {
        assert_eq!(Delimiter::detect_from_line("1,2,0.1,0.2,1.5"), Some(Delimiter::Comma));
        assert_eq!(Delimiter::detect_from_line("1 2 0.1 0.2 1.5"), Some(Delimiter::Space));
        assert_eq!(Delimiter::detect_from_line("1\t2\t0.1\t0.2\t1.5"), Some(Delimiter::Tab));
        assert_eq!(Delimiter::detect_from_line("1;2;0.1;0.2;1.5"), Some(Delimiter::Semicolon));
        assert_eq!(Delimiter::detect_from_line("12345"), None);
        assert_eq!(Delimiter::detect_from_line("0, 0, 0.0, 0.0, 1.0"), Some(Delimiter::Comma));
        assert_eq!(Delimiter::detect_from_line("0 ;0 ;0 ;0 ;1"), Some(Delimiter::Semicolon));
    }

    #[test]
    fn test_parse_comma_rows_with_spaces() {
        let text = "0, 0, 0.0, 0.0, 1.0\n1, 0, 0.5, 0.0, 2.0\n";
        let frame = parse_grid(Cursor::new(text)).unwrap();
        assert_eq!((frame.width(), frame.height()), (2, 1));
        assert_eq!(frame.get(Pixel::new(1, 0)), Some(Point3f::new(0.5, 0.0, 2.0)));
    }

    #[test]
    fn test_parse_rejects_oversized_frames() {
        match parse_grid(Cursor::new("4294967295 0 0 0 1\n")) {
            Err(IoError::ParseError { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected parse error, got {:?}", other),
        }

        let text = "# size 100000 100000\n0 0 0 0 1\n";
        assert!(matches!(
            parse_grid(Cursor::new(text)),
            Err(IoError::ParseError { line: 1, .. })
        ));

        let text = "0 0 0 0 1\n100000 100000 0 0 1\n";
        assert!(matches!(
            parse_grid(Cursor::new(text)),
            Err(IoError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_parse_without_header_infers_size() {
        let text = "0 0 0.0 0.0 1.0\n2 1 0.1 0.2 1.5\n";
        let frame = parse_grid(Cursor::new(text)).unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.get(Pixel::new(2, 1)), Some(Point3f::new(0.1, 0.2, 1.5)));
        assert!(frame.get(Pixel::new(1, 0)).unwrap().z.is_nan());
    }

    #[test]
    fn test_parse_header_in_any_order() {
        let text = "# recorded grid\n# size 4 4\nz,x,y,row,col\n2.5,0.3,-0.1,3,1\n";
        let frame = parse_grid(Cursor::new(text)).unwrap();
        assert_eq!((frame.width(), frame.height()), (4, 4));
        assert_eq!(frame.get(Pixel::new(1, 3)), Some(Point3f::new(0.3, -0.1, 2.5)));
    }

    #[test]
    fn test_parse_accepts_inf_and_nan_values() {
        let text = "0,0,0,0,inf\n1,0,NaN,0,1\n";
        let frame = parse_grid(Cursor::new(text)).unwrap();
        assert_eq!(frame.get(Pixel::new(0, 0)).unwrap().z, f32::INFINITY);
        assert!(frame.get(Pixel::new(1, 0)).unwrap().x.is_nan());
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let text = "0 0 0 0 1\n\n1 0 0 zero 1\n";
        match parse_grid(Cursor::new(text)) {
            Err(IoError::ParseError { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }

        let text = "u,v,x,y\n0,0,0,0\n";
        assert!(matches!(
            parse_grid(Cursor::new(text)),
            Err(IoError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_pixel_outside_declared_size() {
        let text = "# size 2 2\n0 0 0 0 1\n\n5 5 0 0 1\n";
        assert!(matches!(
            parse_grid(Cursor::new(text)),
            Err(IoError::ParseError { line: 4, .. })
        ));
    }

    #[test]
    fn test_write_skips_missing_pixels() {
        let mut frame = DepthFrame::empty(3, 2);
        frame.set(Pixel::new(1, 1), Point3f::new(0.5, 0.25, 2.0));
        let mut out = Vec::new();
        GridTextWriter::write_to(&frame, &mut out, Delimiter::Comma).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "# size 3 2\nu,v,x,y,z\n1,1,0.5,0.25,2\n");

        let parsed = parse_grid(Cursor::new(text)).unwrap();
        assert_eq!(parsed.resolution(), frame.resolution());
        assert_eq!(parsed.get(Pixel::new(1, 1)), frame.get(Pixel::new(1, 1)));
    }
}
