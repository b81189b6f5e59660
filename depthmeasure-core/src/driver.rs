//! Frame-driven measurement loop
//!
//! One iteration per depth frame:
//! 1. grab a frame from the provider; once a recording reports its end the
//!    last frame stays on screen and counts as the current one
//! 2. query the provider at the live cursor (every frame, even when idle)
//! 3. apply the input command polled for this frame
//! 4. hand a [`FrameView`] to the renderer
//!
//! Everything runs on the caller's thread. The loop owns the
//! [`MeasurementSession`] and is the only thing that mutates it.

use crate::error::{Error, Result};
use crate::feedback;
use crate::filter::is_usable;
use crate::point::Pixel;
use crate::sample::{DepthSample, DepthSampleProvider, GrabError};
use crate::session::{MeasurementSession, SelectOutcome};
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A discrete operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select(Pixel),
    Undo,
    Reset,
    Snapshot,
    Quit,
}

/// Source of operator input, abstracted from any UI toolkit
pub trait InputSource {
    /// Current cursor position, if the cursor is over the frame
    fn cursor(&self) -> Option<Pixel>;

    /// Next pending command for this frame, if any
    fn poll_command(&mut self) -> Result<Option<Command>>;
}

/// Renderer and snapshot collaborator
pub trait FrameSink {
    /// Display one frame
    fn present(&mut self, view: &FrameView<'_>) -> Result<()>;

    /// Persist the current frame, returning where it was written
    fn save_snapshot(&mut self, view: &FrameView<'_>) -> Result<PathBuf>;
}

/// Result of probing the provider at the live cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorProbe {
    pub pixel: Pixel,
    pub sample: DepthSample,
    pub valid: bool,
}

/// Read-only view of one frame handed to the renderer
#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    pub frame_index: u64,
    pub session: &'a MeasurementSession,
    pub cursor: Option<CursorProbe>,
    pub depth: &'a dyn DepthSampleProvider,
}

impl FrameView<'_> {
    /// Feedback for the most recent event
    pub fn status(&self) -> String {
        feedback::project(self.session)
    }

    pub fn distance_line(&self) -> Option<String> {
        feedback::distance_line(self.session)
    }

    /// Whether the cursor is over usable depth; false when there is no cursor
    pub fn cursor_valid(&self) -> bool {
        self.cursor.map(|probe| probe.valid).unwrap_or(false)
    }
}

/// Loop tuning
#[derive(Debug, Clone, Default)]
pub struct LoopConfig {
    /// Give up after this many grab failures in a row; `None` retries forever
    pub max_consecutive_grab_failures: Option<u32>,
}

/// Counters collected while the loop runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: u64,
    pub grab_failures: u64,
    pub cursor_queries: u64,
    pub selections_accepted: u64,
    pub selections_rejected: u64,
    pub snapshots: u64,
}

/// Owns the session and the provider for one interactive run
pub struct MeasurementLoop<P> {
    provider: P,
    session: MeasurementSession,
    config: LoopConfig,
    stats: LoopStats,
    deferred: VecDeque<Command>,
    consecutive_failures: u32,
    stream_ended: bool,
}

impl<P: DepthSampleProvider> MeasurementLoop<P> {
    /// Start a run; fails if the provider reports no usable frame size
    pub fn new(provider: P, config: LoopConfig) -> Result<Self> {
        let resolution = provider.resolution();
        if resolution.is_empty() {
            return Err(Error::ProviderUnavailable(format!(
                "provider reports a {}x{} frame",
                resolution.width, resolution.height
            )));
        }
        info!(width = resolution.width, height = resolution.height, "Measurement loop started");

        Ok(Self {
            provider,
            session: MeasurementSession::new(),
            config,
            stats: LoopStats::default(),
            deferred: VecDeque::new(),
            consecutive_failures: 0,
            stream_ended: false,
        })
    }

    pub fn session(&self) -> &MeasurementSession {
        &self.session
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Commands received during failed grabs that are waiting for a frame
    pub fn pending_commands(&self) -> usize {
        self.deferred.len()
    }

    /// Whether the provider has reported the end of its recording
    pub fn stream_ended(&self) -> bool {
        self.stream_ended
    }

    /// Run until a quit command arrives
    pub fn run<I, S>(&mut self, input: &mut I, sink: &mut S) -> Result<LoopStats>
    where
        I: InputSource + ?Sized,
        S: FrameSink + ?Sized,
    {
        while self.step(input, sink)?.is_continue() {}

        if !self.deferred.is_empty() {
            warn!(count = self.deferred.len(), "Discarding commands that never got a frame");
            self.deferred.clear();
        }
        info!(
            frames = self.stats.frames,
            grab_failures = self.stats.grab_failures,
            "Measurement loop finished"
        );
        Ok(self.stats)
    }

    /// Process one frame
    pub fn step<I, S>(&mut self, input: &mut I, sink: &mut S) -> Result<ControlFlow<()>>
    where
        I: InputSource + ?Sized,
        S: FrameSink + ?Sized,
    {
        match self.provider.grab() {
            Ok(()) => {}
            Err(GrabError::EndOfStream) => {
                if !self.stream_ended {
                    info!(frames = self.stats.frames, "End of recording, holding the last frame");
                    self.stream_ended = true;
                }
            }
            Err(err) => return self.skip_frame(err.to_string(), input),
        }
        self.consecutive_failures = 0;
        self.stats.frames += 1;

        let cursor = input.cursor().map(|pixel| {
            self.stats.cursor_queries += 1;
            let sample = self.provider.sample_at(pixel);
            CursorProbe {
                pixel,
                sample,
                valid: is_usable(&sample),
            }
        });

        while let Some(command) = self.deferred.pop_front() {
            if self.apply(command, cursor, sink).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        if let Some(command) = input.poll_command()? {
            if self.apply(command, cursor, sink).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        let view = self.view(cursor);
        sink.present(&view)?;
        Ok(ControlFlow::Continue(()))
    }

    fn skip_frame<I>(&mut self, reason: String, input: &mut I) -> Result<ControlFlow<()>>
    where
        I: InputSource + ?Sized,
    {
        self.stats.grab_failures += 1;
        self.consecutive_failures += 1;
        debug!(%reason, consecutive = self.consecutive_failures, "Frame grab failed");

        if let Some(max) = self.config.max_consecutive_grab_failures {
            if self.consecutive_failures > max {
                return Err(Error::ProviderLost {
                    failures: self.consecutive_failures,
                });
            }
        }

        match input.poll_command()? {
            Some(Command::Quit) => Ok(ControlFlow::Break(())),
            Some(command) => {
                debug!(?command, "Deferring command until the next frame");
                self.deferred.push_back(command);
                Ok(ControlFlow::Continue(()))
            }
            None => Ok(ControlFlow::Continue(())),
        }
    }

    fn apply<S>(&mut self, command: Command, cursor: Option<CursorProbe>, sink: &mut S) -> ControlFlow<()>
    where
        S: FrameSink + ?Sized,
    {
        match command {
            Command::Select(pixel) => {
                match self.session.select(pixel, &self.provider) {
                    SelectOutcome::Rejected(_) => self.stats.selections_rejected += 1,
                    outcome if outcome.changed_points() => self.stats.selections_accepted += 1,
                    _ => {}
                }
            }
            Command::Undo => {
                self.session.undo();
            }
            Command::Reset => self.session.reset(),
            Command::Snapshot => {
                let result = sink
                    .save_snapshot(&self.view(cursor))
                    .map_err(|err| err.to_string());
                match &result {
                    Ok(path) => {
                        self.stats.snapshots += 1;
                        info!(path = %path.display(), "Snapshot saved");
                    }
                    Err(message) => warn!(%message, "Snapshot failed"),
                }
                self.session.record_snapshot(result);
            }
            Command::Quit => {
                info!("Quit requested");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn view(&self, cursor: Option<CursorProbe>) -> FrameView<'_> {
        FrameView {
            frame_index: self.stats.frames,
            session: &self.session,
            cursor,
            depth: &self.provider,
        }
    }
}
