//! Human-readable status for the render loop

use crate::filter::RejectReason;
use crate::point::Point3f;
use crate::session::MeasurementSession;
use std::fmt;
use std::path::PathBuf;

/// The most recent state-changing event of a session
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Feedback {
    #[default]
    Idle,
    PointSelected { index: usize, world: Point3f },
    Measured { distance_cm: f32 },
    InvalidDepth(RejectReason),
    CapacityReached,
    Undone { remaining: usize },
    Reset,
    SnapshotSaved(PathBuf),
    SnapshotFailed(String),
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Idle => Ok(()),
            Feedback::PointSelected { index, world } => write!(
                f,
                "Point {} selected: X={:.3}, Y={:.3}, Z={:.3} m",
                index + 1,
                world.x,
                world.y,
                world.z
            ),
            Feedback::Measured { distance_cm } => write!(f, "Distance: {:.2} cm", distance_cm),
            Feedback::InvalidDepth(reason) => write!(f, "Invalid depth data! ({})", reason),
            Feedback::CapacityReached => {
                f.write_str("Two points already selected, undo or reset first")
            }
            Feedback::Undone { .. } => f.write_str("Last point removed!"),
            Feedback::Reset => f.write_str("Reset!"),
            Feedback::SnapshotSaved(path) => write!(f, "Screenshot saved as {}", path.display()),
            Feedback::SnapshotFailed(message) => write!(f, "Screenshot failed: {}", message),
        }
    }
}

/// Status line describing the session's most recent event
pub fn project(session: &MeasurementSession) -> String {
    session.last_feedback().to_string()
}

/// Distance line shown while a measurement is held
pub fn distance_line(session: &MeasurementSession) -> Option<String> {
    session
        .distance()
        .map(|distance| format!("Distance: {:.2} cm", distance))
}

/// Static usage hint
pub fn instructions() -> &'static str {
    "Click 2 points to measure (in cm) | u: undo | r: reset | s: screenshot | q: quit"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Axis, NonFiniteKind};
    use crate::point::Pixel;

    #[test]
    fn test_idle_projects_empty() {
        let session = MeasurementSession::new();
        assert_eq!(project(&session), "");
        assert_eq!(distance_line(&session), None);
    }

    #[test]
    fn test_point_selected_message() {
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(4, 4), &Ok(Point3f::new(0.1, -0.2, 1.5)));
        assert_eq!(
            project(&session),
            "Point 1 selected: X=0.100, Y=-0.200, Z=1.500 m"
        );
    }

    #[test]
    fn test_distance_messages() {
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(0, 0), &Ok(Point3f::new(0.0, 0.0, 0.0)));
        session.select_sample(Pixel::new(1, 0), &Ok(Point3f::new(0.0, 0.0, 1.0)));
        assert_eq!(project(&session), "Distance: 100.00 cm");
        assert_eq!(distance_line(&session).as_deref(), Some("Distance: 100.00 cm"));
    }

    #[test]
    fn test_invalid_and_recovery_messages() {
        let invalid = Feedback::InvalidDepth(RejectReason::NonFinite {
            axis: Axis::Z,
            kind: NonFiniteKind::Infinite,
        });
        assert_eq!(invalid.to_string(), "Invalid depth data! (z is infinite)");
        assert_eq!(Feedback::Undone { remaining: 0 }.to_string(), "Last point removed!");
        assert_eq!(Feedback::Reset.to_string(), "Reset!");
    }
}
