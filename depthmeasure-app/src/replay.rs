//! Headless sink for scripted replays

use depthmeasure_core::{FrameSink, FrameView, LoopStats, MeasurementSession, Result};
use depthmeasure_visualization::{HeadlessSink, SnapshotWriter};
use std::io::Write;
use std::path::PathBuf;

/// Prints every change of the status line and writes snapshots to disk
pub struct ReplaySink<W> {
    inner: HeadlessSink,
    out: W,
    last_status: String,
}

impl<W: Write> ReplaySink<W> {
    pub fn new(snapshots: SnapshotWriter, out: W) -> Self {
        Self {
            inner: HeadlessSink::new(snapshots),
            out,
            last_status: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for ReplaySink<W> {
    fn present(&mut self, view: &FrameView<'_>) -> Result<()> {
        self.inner.present(view)?;
        let status = view.status();
        if status != self.last_status {
            writeln!(self.out, "[frame {}] {}", view.frame_index, status)?;
            self.last_status = status;
        }
        Ok(())
    }

    fn save_snapshot(&mut self, view: &FrameView<'_>) -> Result<PathBuf> {
        self.inner.save_snapshot(view)
    }
}

/// Closing report of a run
pub fn write_summary<W: Write>(
    out: &mut W,
    session: &MeasurementSession,
    stats: &LoopStats,
) -> std::io::Result<()> {
    writeln!(out, "state: {:?}", session.state())?;
    for (i, point) in session.points().iter().enumerate() {
        let world = point.world();
        writeln!(
            out,
            "P{} {}: X={:.3}, Y={:.3}, Z={:.3} m",
            i + 1,
            point.pixel(),
            world.x,
            world.y,
            world.z
        )?;
    }
    match session.distance() {
        Some(distance) => writeln!(out, "distance: {:.2} cm", distance)?,
        None => writeln!(out, "distance: none")?,
    }
    writeln!(
        out,
        "frames: {}, grab failures: {}, cursor queries: {}, selections: {} accepted / {} rejected, snapshots: {}",
        stats.frames,
        stats.grab_failures,
        stats.cursor_queries,
        stats.selections_accepted,
        stats.selections_rejected,
        stats.snapshots
    )
}
