//! Validity filter for raw depth samples
//!
//! Classifies a provider result as usable or rejected. No clamping and no
//! unit conversion happen here: an accepted triple is passed through as-is.

use crate::point::Point3f;
use crate::sample::{DepthSample, SampleError};
use serde::Serialize;
use std::fmt;

/// Coordinate axis of a camera-space point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Kind of non-finite value found in a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NonFiniteKind {
    Nan,
    Infinite,
}

/// Why a sample was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// The provider reported a failure instead of a point
    Provider(SampleError),
    /// The provider succeeded but a coordinate is NaN or infinite
    NonFinite { axis: Axis, kind: NonFiniteKind },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Provider(err) => write!(f, "{}", err),
            RejectReason::NonFinite { axis, kind: NonFiniteKind::Nan } => {
                write!(f, "{} is NaN", axis)
            }
            RejectReason::NonFinite { axis, kind: NonFiniteKind::Infinite } => {
                write!(f, "{} is infinite", axis)
            }
        }
    }
}

/// A camera-space point that passed the validity filter.
///
/// Cannot be constructed outside this module, so holding one proves that
/// all three coordinates are finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedSample(Point3f);

impl AcceptedSample {
    pub fn world(&self) -> Point3f {
        self.0
    }

    pub(crate) fn into_world(self) -> Point3f {
        self.0
    }
}

/// Outcome of classifying a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validity {
    Accepted(AcceptedSample),
    Rejected(RejectReason),
}

impl Validity {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validity::Accepted(_))
    }
}

/// Classify a raw provider result
pub fn classify(sample: &DepthSample) -> Validity {
    let point = match sample {
        Ok(point) => point,
        Err(err) => return Validity::Rejected(RejectReason::Provider(*err)),
    };

    let axes = [(Axis::X, point.x), (Axis::Y, point.y), (Axis::Z, point.z)];
    for (axis, value) in axes {
        if value.is_nan() {
            return Validity::Rejected(RejectReason::NonFinite { axis, kind: NonFiniteKind::Nan });
        }
        if value.is_infinite() {
            return Validity::Rejected(RejectReason::NonFinite {
                axis,
                kind: NonFiniteKind::Infinite,
            });
        }
    }

    Validity::Accepted(AcceptedSample(*point))
}

/// Whether a sample would be accepted, for the live cursor indicator
pub fn is_usable(sample: &DepthSample) -> bool {
    classify(sample).is_accepted()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_finite_sample_unchanged() {
        let sample: DepthSample = Ok(Point3f::new(-0.25, 1.5, 12.0));
        match classify(&sample) {
            Validity::Accepted(accepted) => {
                assert_eq!(accepted.world(), Point3f::new(-0.25, 1.5, 12.0));
            }
            other => panic!("expected accepted sample, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_provider_error() {
        let sample: DepthSample = Err(SampleError::Provider(7));
        assert_eq!(
            classify(&sample),
            Validity::Rejected(RejectReason::Provider(SampleError::Provider(7)))
        );
    }

    #[test]
    fn test_rejects_nan_on_each_axis() {
        let cases = [
            (Point3f::new(f32::NAN, 0.0, 1.0), Axis::X),
            (Point3f::new(0.0, f32::NAN, 1.0), Axis::Y),
            (Point3f::new(0.0, 0.0, f32::NAN), Axis::Z),
        ];
        for (point, axis) in cases {
            assert_eq!(
                classify(&Ok(point)),
                Validity::Rejected(RejectReason::NonFinite { axis, kind: NonFiniteKind::Nan })
            );
        }
    }

    #[test]
    fn test_rejects_infinity() {
        let sample: DepthSample = Ok(Point3f::new(0.0, 0.0, f32::INFINITY));
        assert_eq!(
            classify(&sample),
            Validity::Rejected(RejectReason::NonFinite {
                axis: Axis::Z,
                kind: NonFiniteKind::Infinite
            })
        );
        assert!(!is_usable(&Ok(Point3f::new(f32::NEG_INFINITY, 0.0, 0.0))));
    }

    #[test]
    fn test_first_offending_axis_wins() {
        let sample: DepthSample = Ok(Point3f::new(0.0, f32::INFINITY, f32::NAN));
        assert_eq!(
            classify(&sample),
            Validity::Rejected(RejectReason::NonFinite {
                axis: Axis::Y,
                kind: NonFiniteKind::Infinite
            })
        );
    }

    #[test]
    fn test_reject_reason_display() {
        let reason = RejectReason::NonFinite { axis: Axis::X, kind: NonFiniteKind::Nan };
        assert_eq!(reason.to_string(), "x is NaN");
        assert_eq!(
            RejectReason::Provider(SampleError::NotAvailable).to_string(),
            "depth not available"
        );
    }
}
