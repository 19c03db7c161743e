// Design matrix coefficients for plane survey observations.
// Coefficients are partial derivatives of the computed observation with respect
// to the coordinates of the points involved, evaluated at the approximate coordinates.

use crate::error::Result;
use crate::geometry::{bearing, distance, Point};

use super::free_terms::check_distinct;

/// Partial derivatives of an observation between a standpoint and a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairCoefficients {
    pub x_from: f64,
    pub y_from: f64,
    pub x_to: f64,
    pub y_to: f64,
}

/// Direction coefficients, including the station orientation unknown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionCoefficients {
    pub pair: PairCoefficients,
    pub orientation: f64,
}

/// Partial derivatives of an angle measured at `at` from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleCoefficients {
    pub x_at: f64,
    pub y_at: f64,
    pub x_from: f64,
    pub y_from: f64,
    pub x_to: f64,
    pub y_to: f64,
}

/// Coefficients of one component of a baseline vector (or of a levelled
/// height difference) with respect to the same coordinate of both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineCoefficients {
    pub from: f64,
    pub to: f64,
}

/// A coordinate difference is linear, so the coefficients are `-1` and `1`
/// for every 1D, 2D or 3D component.
pub fn baseline_coefficients() -> BaselineCoefficients {
    BaselineCoefficients { from: -1.0, to: 1.0 }
}

/// Coefficients of a measured horizontal distance.
pub fn distance_coefficients(from: Point, to: Point) -> Result<PairCoefficients> {
    check_distinct(from, to)?;
    let nu = bearing(from, to);
    let (sin, cos) = nu.sin_cos();
    Ok(PairCoefficients {
        x_from: -cos,
        y_from: -sin,
        x_to: cos,
        y_to: sin,
    })
}

/// Coefficients of a measured azimuth (direction angle), in radians per unit length.
pub fn azimuth_coefficients(from: Point, to: Point) -> Result<PairCoefficients> {
    check_distinct(from, to)?;
    let nu = bearing(from, to);
    let d = distance(from, to);
    let (sin, cos) = nu.sin_cos();
    Ok(PairCoefficients {
        x_from: sin / d,
        y_from: -cos / d,
        x_to: -sin / d,
        y_to: cos / d,
    })
}

/// Coefficients of a measured direction; the orientation unknown enters with `1`.
pub fn direction_coefficients(from: Point, to: Point) -> Result<DirectionCoefficients> {
    Ok(DirectionCoefficients {
        pair: azimuth_coefficients(from, to)?,
        orientation: 1.0,
    })
}

/// Coefficients of the angle `ν(at→to) - ν(at→from)`.
pub fn angle_coefficients(at: Point, from: Point, to: Point) -> Result<AngleCoefficients> {
    check_distinct(from, to)?;
    let back = azimuth_coefficients(at, from)?;
    let ahead = azimuth_coefficients(at, to)?;
    Ok(AngleCoefficients {
        x_at: ahead.x_from - back.x_from,
        y_at: ahead.y_from - back.y_from,
        x_from: -back.x_to,
        y_from: -back.y_to,
        x_to: ahead.x_to,
        y_to: ahead.y_to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdjustError;
    use crate::geometry::normalize_angle;

    fn numeric<F: Fn(&[Point]) -> f64>(pts: &[Point], idx: usize, along_x: bool, f: F) -> f64 {
        let h = 1e-4;
        let mut plus = pts.to_vec();
        let mut minus = pts.to_vec();
        if along_x {
            plus[idx].x += h;
            minus[idx].x -= h;
        } else {
            plus[idx].y += h;
            minus[idx].y -= h;
        }
        (f(&plus) - f(&minus)) / (2.0 * h)
    }

    #[test]
    fn distance_matches_finite_differences() {
        let pts = [Point::new(10.0, 20.0), Point::new(43.0, -7.0)];
        let c = distance_coefficients(pts[0], pts[1]).unwrap();
        let d = |p: &[Point]| distance(p[0], p[1]);
        assert!((c.x_from - numeric(&pts, 0, true, d)).abs() < 1e-6);
        assert!((c.y_from - numeric(&pts, 0, false, d)).abs() < 1e-6);
        assert!((c.x_to - numeric(&pts, 1, true, d)).abs() < 1e-6);
        assert!((c.y_to - numeric(&pts, 1, false, d)).abs() < 1e-6);
    }

    #[test]
    fn azimuth_matches_finite_differences() {
        let pts = [Point::new(0.0, 0.0), Point::new(30.0, 40.0)];
        let c = azimuth_coefficients(pts[0], pts[1]).unwrap();
        let b = |p: &[Point]| bearing(p[0], p[1]);
        assert!((c.x_from - numeric(&pts, 0, true, b)).abs() < 1e-6);
        assert!((c.y_from - numeric(&pts, 0, false, b)).abs() < 1e-6);
        assert!((c.x_to - numeric(&pts, 1, true, b)).abs() < 1e-6);
        assert!((c.y_to - numeric(&pts, 1, false, b)).abs() < 1e-6);
        let dir = direction_coefficients(pts[0], pts[1]).unwrap();
        assert_eq!(dir.pair, c);
        assert_eq!(dir.orientation, 1.0);
    }

    #[test]
    fn angle_matches_finite_differences() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 10.0),
            Point::new(20.0, 80.0),
        ];
        let c = angle_coefficients(pts[0], pts[1], pts[2]).unwrap();
        let ang = |p: &[Point]| normalize_angle(bearing(p[0], p[2]) - bearing(p[0], p[1]));
        assert!((c.x_at - numeric(&pts, 0, true, ang)).abs() < 1e-6);
        assert!((c.y_at - numeric(&pts, 0, false, ang)).abs() < 1e-6);
        assert!((c.x_from - numeric(&pts, 1, true, ang)).abs() < 1e-6);
        assert!((c.y_from - numeric(&pts, 1, false, ang)).abs() < 1e-6);
        assert!((c.x_to - numeric(&pts, 2, true, ang)).abs() < 1e-6);
        assert!((c.y_to - numeric(&pts, 2, false, ang)).abs() < 1e-6);
    }

    #[test]
    fn baseline_is_a_plain_difference() {
        let pts = [Point::new(3.0, 4.0), Point::new(-2.0, 11.0)];
        let c = baseline_coefficients();
        let dx = |p: &[Point]| p[1].x - p[0].x;
        assert!((c.from - numeric(&pts, 0, true, dx)).abs() < 1e-9);
        assert!((c.to - numeric(&pts, 1, true, dx)).abs() < 1e-9);
    }

    #[test]
    fn coincident_points_are_rejected() {
        let p = Point::new(5.0, 5.0);
        assert!(matches!(
            distance_coefficients(p, p),
            Err(AdjustError::InvalidObservation(_))
        ));
        assert!(angle_coefficients(Point::new(0.0, 0.0), p, p).is_err());
    }
}
