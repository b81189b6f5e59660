//! Point selection state machine
//!
//! A [`MeasurementSession`] accumulates at most two validated points. When
//! the second point arrives the distance between them is computed; a third
//! selection is refused rather than rotating out an earlier point. Undo drops
//! the most recent point and reset clears everything.
//!
//! Every operation either applies completely or leaves `points` and
//! `distance` untouched.

use crate::distance::distance_cm;
use crate::feedback::{self, Feedback};
use crate::filter::{classify, RejectReason, Validity};
use crate::point::{Pixel, Point3D};
use crate::sample::{DepthSample, DepthSampleProvider};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Maximum number of points a session holds
pub const MAX_POINTS: usize = 2;

/// Selection state, derived from the number of held points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Empty,
    OneSelected,
    Measured,
}

impl SessionState {
    fn from_len(len: usize) -> Self {
        match len {
            0 => SessionState::Empty,
            1 => SessionState::OneSelected,
            _ => SessionState::Measured,
        }
    }
}

/// What a selection event did to the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectOutcome {
    /// The point was appended; `index` is zero-based
    Added { index: usize },
    /// The point was appended as the second anchor and a distance computed
    Measured { distance_cm: f32 },
    /// The sample failed the validity filter
    Rejected(RejectReason),
    /// The session already holds two points
    AtCapacity,
}

impl SelectOutcome {
    /// Whether the event appended a point
    pub fn changed_points(&self) -> bool {
        matches!(self, SelectOutcome::Added { .. } | SelectOutcome::Measured { .. })
    }
}

/// What an undo event did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    Removed { remaining: usize },
    NothingToUndo,
}

/// The aggregate measurement state owned by the driving loop
#[derive(Debug, Clone, Default)]
pub struct MeasurementSession {
    points: Vec<Point3D>,
    distance: Option<f32>,
    last_feedback: Feedback,
}

impl MeasurementSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(MAX_POINTS),
            distance: None,
            last_feedback: Feedback::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_len(self.points.len())
    }

    /// Accepted points in selection order
    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    /// Distance in centimeters, present exactly when two points are held
    pub fn distance(&self) -> Option<f32> {
        self.distance
    }

    pub fn last_feedback(&self) -> &Feedback {
        &self.last_feedback
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Query `provider` at `pixel` and apply the result as a selection
    pub fn select<P>(&mut self, pixel: Pixel, provider: &P) -> SelectOutcome
    where
        P: DepthSampleProvider + ?Sized,
    {
        let sample = provider.sample_at(pixel);
        self.select_sample(pixel, &sample)
    }

    /// Apply an already-queried sample as a selection at `pixel`
    pub fn select_sample(&mut self, pixel: Pixel, sample: &DepthSample) -> SelectOutcome {
        let accepted = match classify(sample) {
            Validity::Accepted(accepted) => accepted,
            Validity::Rejected(reason) => {
                debug!(%pixel, %reason, "Selection rejected");
                self.last_feedback = Feedback::InvalidDepth(reason);
                return SelectOutcome::Rejected(reason);
            }
        };

        if self.points.len() >= MAX_POINTS {
            debug!(%pixel, "Selection ignored, session already measured");
            self.last_feedback = Feedback::CapacityReached;
            return SelectOutcome::AtCapacity;
        }

        let point = Point3D::new(pixel, accepted);
        self.points.push(point);
        let index = self.points.len() - 1;
        let world = point.world();
        info!(
            index = index + 1,
            %pixel,
            x = world.x,
            y = world.y,
            z = world.z,
            "Point selected"
        );

        if let [first, second] = self.points.as_slice() {
            let distance = distance_cm(&first.world(), &second.world());
            self.distance = Some(distance);
            self.last_feedback = Feedback::Measured { distance_cm: distance };
            info!(distance_cm = distance, "Distance measured");
            SelectOutcome::Measured { distance_cm: distance }
        } else {
            self.last_feedback = Feedback::PointSelected { index, world };
            SelectOutcome::Added { index }
        }
    }

    /// Remove the most recently selected point
    pub fn undo(&mut self) -> UndoOutcome {
        if self.points.pop().is_none() {
            return UndoOutcome::NothingToUndo;
        }
        self.distance = None;
        let remaining = self.points.len();
        self.last_feedback = Feedback::Undone { remaining };
        info!(remaining, "Last point removed");
        UndoOutcome::Removed { remaining }
    }

    /// Drop all points and the measurement
    pub fn reset(&mut self) {
        self.points.clear();
        self.distance = None;
        self.last_feedback = Feedback::Reset;
        info!("Session reset");
    }

    /// Record the result of a snapshot taken by an external collaborator
    pub fn record_snapshot(&mut self, result: std::result::Result<PathBuf, String>) {
        self.last_feedback = match result {
            Ok(path) => Feedback::SnapshotSaved(path),
            Err(message) => Feedback::SnapshotFailed(message),
        };
    }

    /// Read-only copy of the session for renderers and exporters
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            points: self.points.clone(),
            distance_cm: self.distance,
            state: self.state(),
            feedback: feedback::project(self),
        }
    }
}

/// Serializable view of a session at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub points: Vec<Point3D>,
    pub distance_cm: Option<f32>,
    pub state: SessionState,
    pub feedback: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point3f;
    use crate::sample::SampleError;
    use approx::assert_relative_eq;

    fn ok(x: f32, y: f32, z: f32) -> DepthSample {
        Ok(Point3f::new(x, y, z))
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = MeasurementSession::new();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.points().is_empty());
        assert_eq!(session.distance(), None);
        assert_eq!(session.last_feedback(), &Feedback::Idle);
    }

    #[test]
    fn test_two_selections_measure() {
        let mut session = MeasurementSession::new();
        let first = session.select_sample(Pixel::new(10, 10), &ok(0.0, 0.0, 0.0));
        assert_eq!(first, SelectOutcome::Added { index: 0 });
        assert_eq!(session.state(), SessionState::OneSelected);
        assert_eq!(session.distance(), None);

        let second = session.select_sample(Pixel::new(20, 10), &ok(0.0, 0.0, 1.0));
        assert_eq!(second, SelectOutcome::Measured { distance_cm: 100.0 });
        assert_eq!(session.state(), SessionState::Measured);
        assert_relative_eq!(session.distance().unwrap(), 100.0);
        assert_eq!(session.last_feedback(), &Feedback::Measured { distance_cm: 100.0 });
    }

    #[test]
    fn test_rejected_selection_keeps_state() {
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(1, 1), &ok(0.0, 0.0, 2.0));
        let before = session.points().to_vec();

        let outcome = session.select_sample(Pixel::new(2, 2), &ok(f32::NAN, 0.0, 0.0));
        assert!(matches!(outcome, SelectOutcome::Rejected(_)));
        assert!(matches!(session.last_feedback(), Feedback::InvalidDepth(_)));
        assert_eq!(session.points(), before.as_slice());
        assert_eq!(session.distance(), None);

        let outcome = session.select_sample(Pixel::new(2, 2), &Err(SampleError::NotAvailable));
        assert_eq!(
            outcome,
            SelectOutcome::Rejected(RejectReason::Provider(SampleError::NotAvailable))
        );
        assert_eq!(session.points(), before.as_slice());
    }

    #[test]
    fn test_third_selection_is_refused() {
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(0, 0), &ok(0.0, 0.0, 1.0));
        session.select_sample(Pixel::new(5, 0), &ok(0.3, 0.0, 1.0));
        let before = session.points().to_vec();
        let distance = session.distance();

        let outcome = session.select_sample(Pixel::new(9, 9), &ok(1.0, 1.0, 1.0));
        assert_eq!(outcome, SelectOutcome::AtCapacity);
        assert!(!outcome.changed_points());
        assert_eq!(session.points(), before.as_slice());
        assert_eq!(session.distance(), distance);
        assert_eq!(session.last_feedback(), &Feedback::CapacityReached);
    }

    #[test]
    fn test_invalid_sample_while_measured_reports_invalid_depth() {
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(0, 0), &ok(0.0, 0.0, 1.0));
        session.select_sample(Pixel::new(5, 0), &ok(0.3, 0.0, 1.0));

        let outcome = session.select_sample(Pixel::new(9, 9), &ok(0.0, f32::INFINITY, 1.0));
        assert!(matches!(outcome, SelectOutcome::Rejected(_)));
        assert_eq!(session.state(), SessionState::Measured);
    }

    #[test]
    fn test_undo_after_measured() {
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(3, 4), &ok(0.0, 0.0, 0.0));
        session.select_sample(Pixel::new(8, 4), &ok(0.0, 0.0, 1.0));

        assert_eq!(session.undo(), UndoOutcome::Removed { remaining: 1 });
        assert_eq!(session.state(), SessionState::OneSelected);
        assert_eq!(session.distance(), None);
        assert_eq!(session.points()[0].pixel(), Pixel::new(3, 4));
        assert_eq!(session.last_feedback(), &Feedback::Undone { remaining: 1 });

        assert_eq!(session.undo(), UndoOutcome::Removed { remaining: 0 });
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(0, 0), &ok(f32::NAN, 0.0, 0.0));
        let feedback = session.last_feedback().clone();

        assert_eq!(session.undo(), UndoOutcome::NothingToUndo);
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.last_feedback(), &feedback);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut session = MeasurementSession::new();
        session.reset();
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.last_feedback(), &Feedback::Reset);

        session.select_sample(Pixel::new(0, 0), &ok(0.0, 0.0, 1.0));
        session.select_sample(Pixel::new(1, 0), &ok(0.1, 0.0, 1.0));
        session.reset();
        assert!(session.is_empty());
        assert_eq!(session.distance(), None);
    }

    #[test]
    fn test_snapshot_reflects_session() {
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(0, 0), &ok(0.0, 0.0, 1.0));
        session.record_snapshot(Ok(PathBuf::from("shot.png")));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.points.len(), 1);
        assert_eq!(snapshot.state, SessionState::OneSelected);
        assert_eq!(snapshot.distance_cm, None);
        assert!(snapshot.feedback.contains("shot.png"));
    }
}
