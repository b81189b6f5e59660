//! Command scripts for headless replay
//!
//! One command per line, applied one per frame:
//!
//! ```text
//! # measure the patch edge
//! move 400 300
//! select 400 300
//! select 900 300
//! snapshot
//! undo
//! quit
//! ```

use depthmeasure_core::{Command, InputSource, Pixel, Result};
use std::collections::VecDeque;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("failed to read script: {0}")]
    Read(String),
}

/// One scripted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    /// Move the cursor without selecting
    Move(Pixel),
    Command(Command),
}

fn parse_pixel(line: usize, args: &[&str]) -> std::result::Result<Pixel, ScriptError> {
    let error = |message: String| ScriptError::Parse { line, message };
    match args {
        [u, v] => {
            let u = u
                .parse()
                .map_err(|_| error(format!("invalid column '{}'", u)))?;
            let v = v
                .parse()
                .map_err(|_| error(format!("invalid row '{}'", v)))?;
            Ok(Pixel::new(u, v))
        }
        _ => Err(error(format!("expected 2 coordinates, found {}", args.len()))),
    }
}

fn expect_no_args(line: usize, keyword: &str, args: &[&str]) -> std::result::Result<(), ScriptError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ScriptError::Parse {
            line,
            message: format!("'{}' takes no arguments", keyword),
        })
    }
}

/// Parse a script; line numbers in errors start at 1
pub fn parse_script(text: &str) -> std::result::Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let mut words = content.split_whitespace();
        let keyword = words.next().unwrap_or("").to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let step = match keyword.as_str() {
            "select" | "click" => ScriptStep::Command(Command::Select(parse_pixel(line, &args)?)),
            "move" => ScriptStep::Move(parse_pixel(line, &args)?),
            "undo" => {
                expect_no_args(line, "undo", &args)?;
                ScriptStep::Command(Command::Undo)
            }
            "reset" => {
                expect_no_args(line, "reset", &args)?;
                ScriptStep::Command(Command::Reset)
            }
            "snapshot" => {
                expect_no_args(line, "snapshot", &args)?;
                ScriptStep::Command(Command::Snapshot)
            }
            "quit" => {
                expect_no_args(line, "quit", &args)?;
                ScriptStep::Command(Command::Quit)
            }
            other => {
                return Err(ScriptError::Parse {
                    line,
                    message: format!("unknown command '{}'", other),
                })
            }
        };
        steps.push(step);
    }
    Ok(steps)
}

/// Read and parse a script file
pub fn load_script<P: AsRef<Path>>(path: P) -> std::result::Result<Vec<ScriptStep>, ScriptError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ScriptError::Read(format!("{}: {}", path.as_ref().display(), e)))?;
    parse_script(&text)
}

/// Input source that plays back a parsed script, then quits
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    steps: VecDeque<ScriptStep>,
    cursor: Option<Pixel>,
}

impl ScriptedInput {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: steps.into(),
            cursor: None,
        }
    }

    /// Steps not yet played
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl InputSource for ScriptedInput {
    fn cursor(&self) -> Option<Pixel> {
        self.cursor
    }

    fn poll_command(&mut self) -> Result<Option<Command>> {
        match self.steps.pop_front() {
            None => Ok(Some(Command::Quit)),
            Some(ScriptStep::Move(pixel)) => {
                self.cursor = Some(pixel);
                Ok(None)
            }
            Some(ScriptStep::Command(command)) => {
                if let Command::Select(pixel) = command {
                    self.cursor = Some(pixel);
                }
                Ok(Some(command))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_commands() {
        let steps = parse_script(
            "# header\n\nmove 1 2\nselect 3 4  # first point\nCLICK 5 6\nundo\nreset\nsnapshot\nquit\n",
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                ScriptStep::Move(Pixel::new(1, 2)),
                ScriptStep::Command(Command::Select(Pixel::new(3, 4))),
                ScriptStep::Command(Command::Select(Pixel::new(5, 6))),
                ScriptStep::Command(Command::Undo),
                ScriptStep::Command(Command::Reset),
                ScriptStep::Command(Command::Snapshot),
                ScriptStep::Command(Command::Quit),
            ]
        );
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        assert_eq!(
            parse_script("undo\n\nselect 1\n"),
            Err(ScriptError::Parse {
                line: 3,
                message: "expected 2 coordinates, found 1".to_string()
            })
        );
        assert_eq!(
            parse_script("select -1 4"),
            Err(ScriptError::Parse {
                line: 1,
                message: "invalid column '-1'".to_string()
            })
        );
        assert!(matches!(
            parse_script("# ok\njump 1 1"),
            Err(ScriptError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse_script("undo now"),
            Err(ScriptError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_scripted_input_moves_cursor_and_quits_at_end() {
        let mut input = ScriptedInput::new(vec![
            ScriptStep::Move(Pixel::new(7, 8)),
            ScriptStep::Command(Command::Select(Pixel::new(9, 9))),
        ]);
        assert_eq!(input.cursor(), None);
        assert_eq!(input.poll_command().unwrap(), None);
        assert_eq!(input.cursor(), Some(Pixel::new(7, 8)));
        assert_eq!(
            input.poll_command().unwrap(),
            Some(Command::Select(Pixel::new(9, 9)))
        );
        assert_eq!(input.cursor(), Some(Pixel::new(9, 9)));
        assert_eq!(input.remaining(), 0);
        assert_eq!(input.poll_command().unwrap(), Some(Command::Quit));
    }
}
