//! Core data structures and measurement logic for depthmeasure
//!
//! This crate holds everything that carries real invariants in a two-point
//! depth measurement session:
//! - Depth samples and the validity filter that screens them
//! - The bounded point selection state machine
//! - Distance computation and human-readable feedback
//! - The frame-driven loop that ties a depth provider, an input source and
//!   a renderer together

pub mod point;
pub mod sample;
pub mod filter;
pub mod distance;
pub mod session;
pub mod feedback;
pub mod driver;
pub mod error;

pub use point::*;
pub use sample::*;
pub use filter::*;
pub use distance::*;
pub use session::*;
pub use feedback::*;
pub use driver::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::Point3;
