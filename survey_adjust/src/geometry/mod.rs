//! Plane geometry needed to linearize survey observations.

use std::f64::consts::TAU;

mod point;
mod point3;
pub use point::Point;
pub use point3::Point3;

/// Calculates the Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Direction angle (bearing) from `a` to `b` in radians, `atan2(dy, dx)`
/// normalised to `[0, 2π)`.
///
/// Coincident points yield `0.0`; callers that linearize observations reject
/// them before asking for a bearing.
pub fn bearing(a: Point, b: Point) -> f64 {
    normalize_angle((b.y - a.y).atan2(b.x - a.x))
}

/// Wraps an angle in radians into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly 2π for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
