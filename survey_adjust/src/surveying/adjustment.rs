// Least squares network adjustment of plane survey networks

use super::free_terms::{
    angle_free_term, azimuth_free_term, baseline_free_term, direction_free_term,
    distance_free_term, LengthUnit,
};
use super::least_squares::Adjustment;
use super::linearization::{
    angle_coefficients, azimuth_coefficients, baseline_coefficients, direction_coefficients,
    distance_coefficients, PairCoefficients,
};
use super::quality::{QualityConfig, QualityReport};
use crate::error::{AdjustError, Result};
use crate::geometry::Point;
use log::debug;
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;

/// Coordinate axis of a baseline vector component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// Supported observation types for a 2D network.
///
/// Distances are in metres, angular values in radians and standard deviations
/// in the unit of their observation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Observation {
    /// Horizontal distance between two points identified by their indices.
    Distance { from: usize, to: usize, value: f64, std_dev: f64 },
    /// Azimuth (direction angle) from one point to another.
    Azimuth { from: usize, to: usize, value: f64, std_dev: f64 },
    /// Direction of a direction set; `set` selects its orientation unknown.
    Direction { set: usize, from: usize, to: usize, value: f64, std_dev: f64 },
    /// Angle at `at` from the line to `from` to the line to `to`.
    Angle { at: usize, from: usize, to: usize, value: f64, std_dev: f64 },
    /// One component of a measured baseline vector, `to - from` along `axis`.
    Baseline { from: usize, to: usize, axis: Axis, value: f64, std_dev: f64 },
}

impl Observation {
    fn std_dev(&self) -> f64 {
        match *self {
            Observation::Distance { std_dev, .. }
            | Observation::Azimuth { std_dev, .. }
            | Observation::Direction { std_dev, .. }
            | Observation::Angle { std_dev, .. }
            | Observation::Baseline { std_dev, .. } => std_dev,
        }
    }

    fn points(&self) -> Vec<usize> {
        match *self {
            Observation::Distance { from, to, .. }
            | Observation::Azimuth { from, to, .. }
            | Observation::Direction { from, to, .. }
            | Observation::Baseline { from, to, .. } => vec![from, to],
            Observation::Angle { at, from, to, .. } => vec![at, from, to],
        }
    }
}

/// A network point with its approximate coordinates.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NetworkPoint {
    pub name: String,
    pub position: Point,
    /// Fixed points carry no coordinate unknowns.
    pub fixed: bool,
}

impl NetworkPoint {
    pub fn new(name: impl Into<String>, position: Point, fixed: bool) -> Self {
        Self {
            name: name.into(),
            position,
            fixed,
        }
    }
}

/// Linearized observation equations `v = A x + f` with weights `P`.
#[derive(Debug, Clone)]
pub struct DesignSystem {
    pub a: DMatrix<f64>,
    pub p: DMatrix<f64>,
    pub f: DVector<f64>,
}

/// Plane network of points, observations and direction set orientations.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Network {
    pub points: Vec<NetworkPoint>,
    pub observations: Vec<Observation>,
    /// Approximate orientation of each direction set in radians, the angle
    /// that added to a bearing gives the circle reading.
    pub orientations: Vec<f64>,
}

/// Result of a network adjustment.
#[derive(Debug)]
pub struct NetworkAdjustment {
    pub points: Vec<Point>,
    pub orientations: Vec<f64>,
    pub adjustment: Adjustment,
    pub quality: QualityReport,
}

impl Network {
    pub fn new(points: Vec<NetworkPoint>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Adds a direction set with the given approximate orientation and returns its index.
    pub fn add_direction_set(&mut self, orientation: f64) -> usize {
        self.orientations.push(orientation);
        self.orientations.len() - 1
    }

    pub fn observe(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// Adds both components of a plane baseline vector as two observations.
    pub fn observe_baseline(&mut self, from: usize, to: usize, dx: f64, dy: f64, std_dev: f64) {
        for (axis, value) in [(Axis::X, dx), (Axis::Y, dy)] {
            self.observe(Observation::Baseline { from, to, axis, value, std_dev });
        }
    }

    /// Column of the `x` unknown for every free point; `y` follows directly.
    fn index_map(&self) -> HashMap<usize, usize> {
        let mut index_map = HashMap::new();
        let mut count = 0usize;
        for (i, point) in self.points.iter().enumerate() {
            if !point.fixed {
                index_map.insert(i, count);
                count += 2;
            }
        }
        index_map
    }

    /// Number of unknowns: two per free point plus one per direction set.
    pub fn parameter_count(&self) -> usize {
        2 * self.points.iter().filter(|p| !p.fixed).count() + self.orientations.len()
    }

    fn check_observation(&self, row: usize, obs: &Observation) -> Result<()> {
        if let Some(&idx) = obs.points().iter().find(|&&i| i >= self.points.len()) {
            return Err(AdjustError::InvalidObservation(format!(
                "observation {row} references unknown point {idx}"
            )));
        }
        if let Observation::Direction { set, .. } = *obs {
            if set >= self.orientations.len() {
                return Err(AdjustError::InvalidObservation(format!(
                    "observation {row} references unknown direction set {set}"
                )));
            }
        }
        let std_dev = obs.std_dev();
        if !(std_dev > 0.0) || !std_dev.is_finite() {
            return Err(AdjustError::InvalidObservation(format!(
                "observation {row} has standard deviation {std_dev}"
            )));
        }
        Ok(())
    }

    /// Linearizes every observation at the approximate coordinates.
    ///
    /// Weights are `sigma0_squared / std_dev²`.
    pub fn design_system(&self, sigma0_squared: f64) -> Result<DesignSystem> {
        let index_map = self.index_map();
        let orientation_offset = 2 * index_map.len();
        let num_obs = self.observations.len();
        let mut a = DMatrix::<f64>::zeros(num_obs, self.parameter_count());
        let mut f = DVector::<f64>::zeros(num_obs);
        let mut p = DMatrix::<f64>::zeros(num_obs, num_obs);

        let put = |a: &mut DMatrix<f64>, row: usize, point: usize, dx: f64, dy: f64| {
            if let Some(&idx) = index_map.get(&point) {
                a[(row, idx)] += dx;
                a[(row, idx + 1)] += dy;
            }
        };
        let put_pair =
            |a: &mut DMatrix<f64>, row: usize, from: usize, to: usize, c: PairCoefficients| {
                put(a, row, from, c.x_from, c.y_from);
                put(a, row, to, c.x_to, c.y_to);
            };

        for (row, obs) in self.observations.iter().enumerate() {
            self.check_observation(row, obs)?;
            let pos = |i: usize| self.points[i].position;
            p[(row, row)] = sigma0_squared / obs.std_dev().powi(2);
            match *obs {
                Observation::Distance { from, to, value, .. } => {
                    f[row] = distance_free_term(pos(from), pos(to), value, LengthUnit::Metre)?.value;
                    put_pair(&mut a, row, from, to, distance_coefficients(pos(from), pos(to))?);
                }
                Observation::Azimuth { from, to, value, .. } => {
                    f[row] = azimuth_free_term(pos(from), pos(to), value)?.value;
                    put_pair(&mut a, row, from, to, azimuth_coefficients(pos(from), pos(to))?);
                }
                Observation::Direction { set, from, to, value, .. } => {
                    let orientation = self.orientations[set];
                    f[row] = direction_free_term(pos(from), pos(to), value, orientation)?.value;
                    let c = direction_coefficients(pos(from), pos(to))?;
                    put_pair(&mut a, row, from, to, c.pair);
                    a[(row, orientation_offset + set)] = c.orientation;
                }
                Observation::Angle { at, from, to, value, .. } => {
                    f[row] = angle_free_term(pos(at), pos(from), pos(to), value)?.value;
                    let c = angle_coefficients(pos(at), pos(from), pos(to))?;
                    put(&mut a, row, at, c.x_at, c.y_at);
                    put(&mut a, row, from, c.x_from, c.y_from);
                    put(&mut a, row, to, c.x_to, c.y_to);
                }
                Observation::Baseline { from, to, axis, value, .. } => {
                    let (start, end) = (pos(from), pos(to));
                    let (s, t, kx, ky) = match axis {
                        Axis::X => (start.x, end.x, 1.0, 0.0),
                        Axis::Y => (start.y, end.y, 0.0, 1.0),
                    };
                    f[row] = baseline_free_term(s, t, value).value;
                    let c = baseline_coefficients();
                    put(&mut a, row, from, c.from * kx, c.from * ky);
                    put(&mut a, row, to, c.to * kx, c.to * ky);
                }
            }
        }

        debug!(
            "linearized {} observations into {} unknowns",
            num_obs,
            a.ncols()
        );
        Ok(DesignSystem { a, p, f })
    }

    /// Datum matrix spanning the null space of the normal matrix, with no
    /// columns once the fixed points and observations define the datum.
    ///
    /// Without fixed points the columns are the two translations, the
    /// rotation about the centroid and the scale. A single fixed point
    /// removes the translations and leaves rotation and scale about that
    /// point. Azimuths and baselines fix the rotation, distances and
    /// baselines fix the scale, and two fixed points fix both.
    pub fn datum_matrix(&self) -> DMatrix<f64> {
        let n = self.parameter_count();
        let fixed: Vec<Point> = self
            .points
            .iter()
            .filter(|p| p.fixed)
            .map(|p| p.position)
            .collect();
        if fixed.len() >= 2 {
            return DMatrix::zeros(n, 0);
        }
        let oriented = self
            .observations
            .iter()
            .any(|o| matches!(o, Observation::Azimuth { .. } | Observation::Baseline { .. }));
        let scaled = self
            .observations
            .iter()
            .any(|o| matches!(o, Observation::Distance { .. } | Observation::Baseline { .. }));

        let index_map = self.index_map();
        let (cx, cy) = match fixed.first() {
            Some(origin) => (origin.x, origin.y),
            None => {
                let count = self.points.len().max(1) as f64;
                let sx: f64 = self.points.iter().map(|p| p.position.x).sum();
                let sy: f64 = self.points.iter().map(|p| p.position.y).sum();
                (sx / count, sy / count)
            }
        };

        let orientation_offset = 2 * index_map.len();
        let mut tx = DVector::<f64>::zeros(n);
        let mut ty = DVector::<f64>::zeros(n);
        let mut rotation = DVector::<f64>::zeros(n);
        let mut scale = DVector::<f64>::zeros(n);
        for (point, &idx) in &index_map {
            let pos = self.points[*point].position;
            tx[idx] = 1.0;
            ty[idx + 1] = 1.0;
            rotation[idx] = -(pos.y - cy);
            rotation[idx + 1] = pos.x - cx;
            scale[idx] = pos.x - cx;
            scale[idx + 1] = pos.y - cy;
        }
        for set in 0..self.orientations.len() {
            rotation[orientation_offset + set] = -1.0;
        }

        let mut columns: Vec<DVector<f64>> = Vec::new();
        if fixed.is_empty() {
            columns.push(tx);
            columns.push(ty);
        }
        if !oriented {
            columns.push(rotation);
        }
        if !scaled {
            columns.push(scale);
        }
        if columns.is_empty() {
            return DMatrix::zeros(n, 0);
        }
        DMatrix::from_columns(&columns)
    }
}

/// Adjusts a 2D network returning updated coordinates, orientations and the
/// statistical analysis of the solution.
///
/// A network whose fixed points leave a datum defect is adjusted as a free
/// network using [`Network::datum_matrix`].
pub fn adjust_network(network: &Network, config: &QualityConfig) -> Result<NetworkAdjustment> {
    config.validate()?;
    let system = network.design_system(config.sigma0_squared)?;
    let g = network.datum_matrix();
    let adjustment = if g.ncols() == 0 {
        Adjustment::regular(&system.a, &system.p, &system.f)?
    } else {
        debug!("datum defect {} left by the fixed points", g.ncols());
        Adjustment::with_datum(&system.a, &system.p, &system.f, &g)?
    };

    let delta = adjustment.solution();
    let mut points: Vec<Point> = network.points.iter().map(|p| p.position).collect();
    for (idx, pidx) in network.index_map() {
        points[idx].x += delta[pidx];
        points[idx].y += delta[pidx + 1];
    }
    let offset = network.parameter_count() - network.orientations.len();
    let orientations = network
        .orientations
        .iter()
        .enumerate()
        .map(|(set, z)| z + delta[offset + set])
        .collect();

    let quality = QualityReport::evaluate(&adjustment, config)?;
    Ok(NetworkAdjustment {
        points,
        orientations,
        adjustment,
        quality,
    })
}
