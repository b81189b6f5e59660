//! Error types for depthmeasure

use thiserror::Error;

/// Main error type for depthmeasure operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Depth provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Depth provider lost after {failures} consecutive grab failures")]
    ProviderLost { failures: u32 },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for depthmeasure operations
pub type Result<T> = std::result::Result<T, Error>;
