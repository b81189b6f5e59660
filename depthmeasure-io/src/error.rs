//! Error types for depth frame I/O

use thiserror::Error;

/// Errors that can occur while reading or writing depth data
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Frame size mismatch: expected {expected} points, found {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for depth frame I/O
pub type Result<T> = std::result::Result<T, IoError>;

impl From<IoError> for depthmeasure_core::Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Io(io) => depthmeasure_core::Error::Io(io),
            IoError::InvalidFormat { format } => depthmeasure_core::Error::UnsupportedFormat(format),
            other => depthmeasure_core::Error::InvalidData(other.to_string()),
        }
    }
}
