//! Visualization for depthmeasure
//!
//! This crate renders the measurement loop's frames:
//! - Overlay model shared by every renderer
//! - Depth colormap
//! - PNG snapshots with a JSON sidecar
//! - Interactive terminal front-end using ratatui and crossterm

pub mod overlay;
pub mod colormap;
pub mod snapshot;
pub mod terminal;

pub use overlay::*;
pub use colormap::*;
pub use snapshot::*;
pub use terminal::{open as open_terminal, DepthWidget, KeyAction, StatusBar, TerminalDisplay, TerminalInput, Viewport};
