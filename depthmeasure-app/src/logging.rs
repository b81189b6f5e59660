//! Logging setup

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter directive for the command line flags, `None` to defer to `RUST_LOG`
pub fn directive(verbose: u8, level: Option<&str>) -> Option<String> {
    if let Some(level) = level {
        return Some(level.to_string());
    }
    match verbose {
        0 => None,
        1 => Some("info".to_string()),
        2 => Some("debug".to_string()),
        _ => Some("trace".to_string()),
    }
}

fn filter(verbose: u8, level: Option<&str>) -> EnvFilter {
    match directive(verbose, level) {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    }
}

/// Where log lines go
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    /// Discard everything; used while the terminal UI owns the screen
    Discard,
}

/// Install the global subscriber
pub fn init(verbose: u8, level: Option<&str>, target: LogTarget<'_>) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose, level))
        .with_target(true)
        .with_level(true);

    match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        LogTarget::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init()
        }
        LogTarget::Discard => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_precedence() {
        assert_eq!(directive(0, None), None);
        assert_eq!(directive(1, None).as_deref(), Some("info"));
        assert_eq!(directive(2, None).as_deref(), Some("debug"));
        assert_eq!(directive(5, None).as_deref(), Some("trace"));
        assert_eq!(
            directive(2, Some("depthmeasure_core=trace")).as_deref(),
            Some("depthmeasure_core=trace")
        );
    }
}
