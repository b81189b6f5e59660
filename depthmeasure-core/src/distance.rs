//! Euclidean distance between measurement anchors

use crate::point::Point3f;

/// Scale factor from camera-space meters to reported centimeters
pub const METERS_TO_CENTIMETERS: f32 = 100.0;

/// Straight-line distance between two camera-space points, in centimeters
pub fn distance_cm(a: &Point3f, b: &Point3f) -> f32 {
    nalgebra::distance(a, b) * METERS_TO_CENTIMETERS
}
