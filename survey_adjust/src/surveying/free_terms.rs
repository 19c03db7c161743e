//! Free terms (reduced observations) of the observation equations.
//!
//! A free term is the value computed from approximate coordinates minus the
//! measured value, matching the `v = A x + f` form used by the adjustment.
//! Each free term can optionally be screened against a tolerance before the
//! adjustment to catch gross input errors.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::error::{AdjustError, Result};
use crate::geometry::{bearing, distance, normalize_angle, Point, Point3};

/// Unit in which a distance free term is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Metre,
    Decimetre,
    Centimetre,
    Millimetre,
}

impl LengthUnit {
    /// Number of units in one metre.
    pub fn per_metre(self) -> f64 {
        match self {
            LengthUnit::Metre => 1.0,
            LengthUnit::Decimetre => 10.0,
            LengthUnit::Centimetre => 100.0,
            LengthUnit::Millimetre => 1000.0,
        }
    }

    /// Converts a length given in metres into this unit.
    pub fn from_metres(self, metres: f64) -> f64 {
        metres * self.per_metre()
    }
}

/// Reduced observation together with the result of its tolerance screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FreeTerm {
    pub value: f64,
    /// `None` until the term is screened with [`FreeTerm::screened`].
    pub tolerance_satisfied: Option<bool>,
}

impl FreeTerm {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            tolerance_satisfied: None,
        }
    }

    /// Records whether the free term stays within `tolerance`.
    pub fn screened(self, tolerance: f64) -> Self {
        Self {
            tolerance_satisfied: Some(tolerance_satisfied(self.value, tolerance)),
            ..self
        }
    }
}

/// `true` when `|f|` does not exceed `|tolerance|`.
pub fn tolerance_satisfied(f: f64, tolerance: f64) -> bool {
    f.abs() <= tolerance.abs()
}

/// Fails when two points share both coordinates.
pub fn check_distinct(a: Point, b: Point) -> Result<()> {
    if a.coincides(&b) {
        Err(AdjustError::InvalidObservation(format!(
            "points ({}, {}) and ({}, {}) coincide",
            a.x, a.y, b.x, b.y
        )))
    } else {
        Ok(())
    }
}

/// Fails when an angle in radians lies outside `[0, 2π)`.
pub fn check_full_circle(name: &str, angle: f64) -> Result<()> {
    if (0.0..TAU).contains(&angle) {
        Ok(())
    } else {
        Err(AdjustError::InvalidObservation(format!(
            "{name} = {angle} rad must lie in [0, 2π)"
        )))
    }
}

// Differences of two full-circle angles close the gap across north; the
// result always lies in [-π, π].
fn wrap_difference(diff: f64) -> f64 {
    if diff > PI {
        diff - TAU
    } else if diff < -PI {
        diff + TAU
    } else {
        diff
    }
}

/// Free term of a horizontal distance measured in metres, expressed in `unit`.
///
/// A tolerance passed to [`FreeTerm::screened`] afterwards is read in `unit`
/// as well.
pub fn distance_free_term(
    from: Point,
    to: Point,
    measured: f64,
    unit: LengthUnit,
) -> Result<FreeTerm> {
    check_distinct(from, to)?;
    if measured <= 0.0 {
        return Err(AdjustError::InvalidObservation(format!(
            "measured distance {measured} must be positive"
        )));
    }
    Ok(FreeTerm::new(unit.from_metres(distance(from, to) - measured)))
}

/// Free term of a measured azimuth (direction angle) in radians.
pub fn azimuth_free_term(from: Point, to: Point, measured: f64) -> Result<FreeTerm> {
    check_distinct(from, to)?;
    check_full_circle("azimuth", measured)?;
    Ok(FreeTerm::new(wrap_difference(bearing(from, to) - measured)))
}

/// Free term of a measured direction given the approximate orientation of the
/// direction set, `orientation + ν - measured`.
pub fn direction_free_term(
    from: Point,
    to: Point,
    measured: f64,
    orientation: f64,
) -> Result<FreeTerm> {
    check_distinct(from, to)?;
    check_full_circle("direction", measured)?;
    check_full_circle("orientation", orientation)?;
    Ok(FreeTerm::new(wrap_difference(
        orientation + bearing(from, to) - measured,
    )))
}

/// Free term of an angle measured clockwise from `from` to `to` at `at`.
pub fn angle_free_term(at: Point, from: Point, to: Point, measured: f64) -> Result<FreeTerm> {
    check_distinct(at, from)?;
    check_distinct(at, to)?;
    check_distinct(from, to)?;
    check_full_circle("angle", measured)?;
    let computed = normalize_angle(bearing(at, to) - bearing(at, from));
    Ok(FreeTerm::new(wrap_difference(computed - measured)))
}

/// Free term of an angle derived from two measured directions.
pub fn angle_free_term_from_directions(
    at: Point,
    from: Point,
    direction_from: f64,
    to: Point,
    direction_to: f64,
) -> Result<FreeTerm> {
    check_full_circle("direction", direction_from)?;
    check_full_circle("direction", direction_to)?;
    angle_free_term(at, from, to, normalize_angle(direction_to - direction_from))
}

/// Free term of one coordinate difference, a levelled height difference or a
/// single component of a baseline vector, `to - from - measured`.
pub fn baseline_free_term(from: f64, to: f64, measured: f64) -> FreeTerm {
    FreeTerm::new(to - from - measured)
}

/// Free terms of a plane baseline vector measured as `(dx, dy)`.
pub fn baseline_free_terms_2d(from: Point, to: Point, dx: f64, dy: f64) -> [FreeTerm; 2] {
    [
        baseline_free_term(from.x, to.x, dx),
        baseline_free_term(from.y, to.y, dy),
    ]
}

/// Free terms of a spatial (GNSS) baseline vector measured as `(dx, dy, dz)`.
pub fn baseline_free_terms_3d(
    from: Point3,
    to: Point3,
    dx: f64,
    dy: f64,
    dz: f64,
) -> [FreeTerm; 3] {
    [
        baseline_free_term(from.x, to.x, dx),
        baseline_free_term(from.y, to.y, dy),
        baseline_free_term(from.z, to.z, dz),
    ]
}
