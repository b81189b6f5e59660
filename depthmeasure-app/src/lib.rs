//! Command line front end for depthmeasure
//!
//! Configuration, logging setup and headless script replay used by the
//! `depthmeasure` binary.

pub mod config;
pub mod logging;
pub mod replay;
pub mod script;

pub use config::{AppConfig, SourceConfig};
pub use replay::{write_summary, ReplaySink};
pub use script::{load_script, parse_script, ScriptError, ScriptStep, ScriptedInput};
