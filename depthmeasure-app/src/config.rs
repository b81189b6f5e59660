//! Application configuration

use anyhow::{Context, Result};
use depthmeasure_core::{DepthSampleProvider, LoopConfig};
use depthmeasure_io::{FrameSequence, SyntheticConfig, SyntheticScene};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Where depth frames come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Synthetic(SyntheticConfig),
    File {
        paths: Vec<PathBuf>,
        #[serde(default)]
        looping: bool,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Synthetic(SyntheticConfig::default())
    }
}

impl SourceConfig {
    /// Open the configured depth source
    pub fn open(&self) -> Result<Box<dyn DepthSampleProvider>> {
        match self {
            SourceConfig::Synthetic(config) => {
                info!(width = config.width, height = config.height, "Opening synthetic scene");
                Ok(Box::new(SyntheticScene::new(config.clone())))
            }
            SourceConfig::File { paths, looping } => {
                info!(count = paths.len(), looping, "Opening recorded frames");
                let sequence = FrameSequence::from_paths(paths.as_slice(), *looping)
                    .with_context(|| format!("failed to load depth frames {:?}", paths))?;
                debug!(frames = sequence.frame_count(), "Recording loaded");
                Ok(Box::new(sequence))
            }
        }
    }
}

/// Settings read from the JSON config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// How long the terminal waits for input each frame
    pub frame_interval_ms: u64,
    pub max_consecutive_grab_failures: Option<u32>,
    /// Directory for screenshots and measurement exports
    pub output_dir: PathBuf,
    pub source: SourceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            max_consecutive_grab_failures: None,
            output_dir: PathBuf::from("."),
            source: SourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load a config file; a file that does not exist is an error
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map(Self::load).unwrap_or_else(|| Ok(Self::default()))
    }

    /// Replace the source with recorded frames when any are given
    pub fn with_source_files(mut self, paths: Vec<PathBuf>, looping: bool) -> Self {
        if !paths.is_empty() {
            self.source = SourceConfig::File { paths, looping };
        }
        self
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            max_consecutive_grab_failures: self.max_consecutive_grab_failures,
        }
    }
}
