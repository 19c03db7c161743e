// Parametric least squares adjustment with optional datum stabilization.
// Produces the solution together with the full cofactor and reliability matrix suite.

use crate::error::{shape, vec_shape, AdjustError, Result};
use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Result of a parametric (indirect) least squares adjustment.
///
/// Observation equations are written as `v = A x + f` where `f` holds the
/// free terms (computed minus observed). Every matrix is computed once at
/// construction and only read afterwards.
#[derive(Debug, Clone)]
pub struct Adjustment {
    a: DMatrix<f64>,
    p: DMatrix<f64>,
    f: DVector<f64>,
    g: Option<DMatrix<f64>>,
    normal_matrix: DMatrix<f64>,
    normal_vector: DVector<f64>,
    qx: DMatrix<f64>,
    x: DVector<f64>,
    v: DVector<f64>,
    s_squared: f64,
    redundancy: usize,
    q_lcap: DMatrix<f64>,
    qv: DMatrix<f64>,
    ql: DMatrix<f64>,
    r: DMatrix<f64>,
    u: DMatrix<f64>,
}

/// Compact, serializable overview of an adjustment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentSummary {
    pub observations: usize,
    pub parameters: usize,
    pub datum_defect: usize,
    pub redundancy: usize,
    pub reference_variance: f64,
    pub parameters_estimate: Vec<f64>,
    pub residuals: Vec<f64>,
    pub redundancy_numbers: Vec<f64>,
}

fn check_system(a: &DMatrix<f64>, p: &DMatrix<f64>, f: &DVector<f64>) -> Result<()> {
    if a.nrows() < a.ncols() {
        return Err(AdjustError::DimensionMismatch(format!(
            "A({}) must have at least as many rows as columns",
            shape(a)
        )));
    }
    if p.nrows() != p.ncols() {
        return Err(AdjustError::DimensionMismatch(format!(
            "P({}) must be square",
            shape(p)
        )));
    }
    if a.nrows() != p.nrows() {
        return Err(AdjustError::DimensionMismatch(format!(
            "A({}) and P({}) must have the same number of rows",
            shape(a),
            shape(p)
        )));
    }
    if f.len() != p.ncols() {
        return Err(AdjustError::DimensionMismatch(format!(
            "P({}) and f({}) disagree on the number of observations",
            shape(p),
            vec_shape(f)
        )));
    }
    Ok(())
}

fn invert(m: &DMatrix<f64>, name: &'static str) -> Result<DMatrix<f64>> {
    m.clone().try_inverse().ok_or(AdjustError::Singular(name))
}

impl Adjustment {
    /// Adjusts a full-rank system.
    ///
    /// `a` - design matrix (m x n)
    /// `p` - weight matrix of the observations (m x m)
    /// `f` - free term vector (m)
    ///
    /// The redundancy `m - n` has to be at least one. A singular normal
    /// matrix is reported as [`AdjustError::Singular`]; rank deficient
    /// networks belong in [`Adjustment::with_datum`].
    pub fn regular(a: &DMatrix<f64>, p: &DMatrix<f64>, f: &DVector<f64>) -> Result<Self> {
        check_system(a, p, f)?;
        if a.nrows() == a.ncols() {
            return Err(AdjustError::DimensionMismatch(format!(
                "A({}) leaves no redundant observations",
                shape(a)
            )));
        }
        let redundancy = a.nrows() - a.ncols();
        debug!(
            "regular adjustment of {} observations, {} parameters, redundancy {}",
            a.nrows(),
            a.ncols(),
            redundancy
        );
        let normal_matrix = a.transpose() * p * a;
        let qx = invert(&normal_matrix, "N")?;
        Self::solve(a, p, f, None, normal_matrix, qx, redundancy)
    }

    /// Adjusts a free (datum deficient) network.
    ///
    /// `g` (n x d) spans the null space of the normal matrix. The parameter
    /// cofactor matrix is the regularized pseudo-inverse
    /// `(N + G Gᵗ)⁻¹ N (N + G Gᵗ)⁻¹`, which gives the minimum norm solution,
    /// and the redundancy becomes `m - n + d`.
    pub fn with_datum(
        a: &DMatrix<f64>,
        p: &DMatrix<f64>,
        f: &DVector<f64>,
        g: &DMatrix<f64>,
    ) -> Result<Self> {
        check_system(a, p, f)?;
        if g.nrows() != a.ncols() {
            return Err(AdjustError::DimensionMismatch(format!(
                "G({}) must have one row per parameter of A({})",
                shape(g),
                shape(a)
            )));
        }
        if g.ncols() == 0 {
            return Err(AdjustError::DimensionMismatch(format!(
                "G({}) must have at least one column",
                shape(g)
            )));
        }
        let redundancy = a.nrows() - a.ncols() + g.ncols();
        debug!(
            "datum adjustment of {} observations, {} parameters, defect {}, redundancy {}",
            a.nrows(),
            a.ncols(),
            g.ncols(),
            redundancy
        );
        let normal_matrix = a.transpose() * p * a;
        let stabilized = invert(&(&normal_matrix + g * g.transpose()), "N + GGᵗ")?;
        let qx = &stabilized * &normal_matrix * &stabilized;
        Self::solve(a, p, f, Some(g.clone()), normal_matrix, qx, redundancy)
    }

    fn solve(
        a: &DMatrix<f64>,
        p: &DMatrix<f64>,
        f: &DVector<f64>,
        g: Option<DMatrix<f64>>,
        normal_matrix: DMatrix<f64>,
        qx: DMatrix<f64>,
        redundancy: usize,
    ) -> Result<Self> {
        let at = a.transpose();
        let normal_vector = &at * p * f;
        let x = -(&qx * &normal_vector);
        let v = a * &x + f;
        let s_squared = v.dot(&(p * &v)) / redundancy as f64;

        let q_lcap = a * &qx * &at;
        let qv = invert(p, "P")? - &q_lcap;
        let ql = &qv + &q_lcap;
        let ql_inv = invert(&ql, "Ql")?;
        let r = &qv * &ql_inv;
        let u = &q_lcap * &ql_inv;
        debug!("a posteriori variance of unit weight {s_squared}");

        Ok(Self {
            a: a.clone(),
            p: p.clone(),
            f: f.clone(),
            g,
            normal_matrix,
            normal_vector,
            qx,
            x,
            v,
            s_squared,
            redundancy,
            q_lcap,
            qv,
            ql,
            r,
            u,
        })
    }

    /// Design matrix `A`.
    pub fn design_matrix(&self) -> &DMatrix<f64> {
        &self.a
    }

    /// Weight matrix `P`.
    pub fn weights(&self) -> &DMatrix<f64> {
        &self.p
    }

    /// Free term vector `f`.
    pub fn free_terms(&self) -> &DVector<f64> {
        &self.f
    }

    /// Datum matrix `G`, present only for free network adjustments.
    pub fn datum_matrix(&self) -> Option<&DMatrix<f64>> {
        self.g.as_ref()
    }

    /// Normal matrix `N = Aᵗ P A`.
    pub fn normal_matrix(&self) -> &DMatrix<f64> {
        &self.normal_matrix
    }

    /// Absolute term of the normal equations `n = Aᵗ P f`.
    pub fn normal_vector(&self) -> &DVector<f64> {
        &self.normal_vector
    }

    /// Cofactor matrix of the parameters `Qx`.
    pub fn qx(&self) -> &DMatrix<f64> {
        &self.qx
    }

    /// Estimated parameter corrections `x`.
    pub fn solution(&self) -> &DVector<f64> {
        &self.x
    }

    /// Observation residuals `v = A x + f`.
    pub fn residuals(&self) -> &DVector<f64> {
        &self.v
    }

    /// A posteriori variance of unit weight `s² = vᵗ P v / f`.
    pub fn reference_variance(&self) -> f64 {
        self.s_squared
    }

    /// Degrees of freedom of the adjustment.
    pub fn redundancy(&self) -> usize {
        self.redundancy
    }

    /// Number of datum conditions, zero for a regular adjustment.
    pub fn datum_defect(&self) -> usize {
        self.g.as_ref().map_or(0, |g| g.ncols())
    }

    /// Cofactor matrix of the adjusted observations `A Qx Aᵗ`.
    pub fn q_lcap(&self) -> &DMatrix<f64> {
        &self.q_lcap
    }

    /// Cofactor matrix of the residuals `P⁻¹ - Qlcap`.
    pub fn qv(&self) -> &DMatrix<f64> {
        &self.qv
    }

    /// Cofactor matrix of the observations `Qv + Qlcap`.
    pub fn ql(&self) -> &DMatrix<f64> {
        &self.ql
    }

    /// Internal reliability matrix `R = Qv Ql⁻¹`.
    pub fn internal_reliability(&self) -> &DMatrix<f64> {
        &self.r
    }

    /// External reliability matrix `U = A Qx Aᵗ Ql⁻¹`.
    pub fn external_reliability(&self) -> &DMatrix<f64> {
        &self.u
    }

    /// Redundancy numbers, the diagonal of `R`. They sum to the redundancy.
    pub fn redundancy_numbers(&self) -> DVector<f64> {
        self.r.diagonal()
    }

    /// Variance-covariance matrix of the parameters `s² Qx`.
    pub fn parameter_covariance(&self) -> DMatrix<f64> {
        &self.qx * self.s_squared
    }

    /// Standard deviations of the estimated parameters.
    pub fn parameter_std_devs(&self) -> DVector<f64> {
        self.qx.diagonal().map(|q| (self.s_squared * q).max(0.0).sqrt())
    }

    /// Serializable overview of the adjustment.
    pub fn summary(&self) -> AdjustmentSummary {
        AdjustmentSummary {
            observations: self.a.nrows(),
            parameters: self.a.ncols(),
            datum_defect: self.datum_defect(),
            redundancy: self.redundancy,
            reference_variance: self.s_squared,
            parameters_estimate: self.x.iter().copied().collect(),
            residuals: self.v.iter().copied().collect(),
            redundancy_numbers: self.redundancy_numbers().iter().copied().collect(),
        }
    }
}
