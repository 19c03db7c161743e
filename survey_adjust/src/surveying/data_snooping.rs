//! Baarda's data snooping (B-method).
//!
//! Unlike the tau test this uses the a priori variance of unit weight and
//! weights each residual with its redundancy number.

use super::distributions::{noncentrality_parameter, BetaMeaning};
use super::tau_test::{failing_indices, test_statistic};
use crate::error::{check_probability, shape, vec_shape, AdjustError, Result};
use log::warn;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSnooping {
    lambda_sqrt: f64,
    statistics: Vec<f64>,
    results: Vec<bool>,
}

impl DataSnooping {
    /// Screens every observation against `√λ`, `beta` being the test power.
    ///
    /// `sigma0_squared` - a priori variance of unit weight
    /// `v` - residuals
    /// `ql` - cofactor matrix of the observations
    /// `r` - internal reliability matrix, only its diagonal is used
    pub fn new(
        sigma0_squared: f64,
        v: &DVector<f64>,
        ql: &DMatrix<f64>,
        r: &DMatrix<f64>,
        alpha: f64,
        beta: f64,
    ) -> Result<Self> {
        Self::with_beta_meaning(sigma0_squared, v, ql, r, alpha, beta, BetaMeaning::Power)
    }

    /// Same as [`DataSnooping::new`] with an explicit reading of `beta`.
    pub fn with_beta_meaning(
        sigma0_squared: f64,
        v: &DVector<f64>,
        ql: &DMatrix<f64>,
        r: &DMatrix<f64>,
        alpha: f64,
        beta: f64,
        meaning: BetaMeaning,
    ) -> Result<Self> {
        if ql.nrows() != ql.ncols() {
            return Err(AdjustError::DimensionMismatch(format!(
                "Ql({}) must be square",
                shape(ql)
            )));
        }
        if r.nrows() != r.ncols() {
            return Err(AdjustError::DimensionMismatch(format!(
                "R({}) must be square",
                shape(r)
            )));
        }
        if ql.nrows() != r.nrows() {
            return Err(AdjustError::DimensionMismatch(format!(
                "Ql({}) and R({}) must have the same size",
                shape(ql),
                shape(r)
            )));
        }
        if v.len() != r.ncols() {
            return Err(AdjustError::DimensionMismatch(format!(
                "R({}) and v({}) disagree on the number of observations",
                shape(r),
                vec_shape(v)
            )));
        }
        check_probability("alpha", alpha)?;
        check_probability("beta", beta)?;

        let lambda_sqrt = noncentrality_parameter(alpha, beta, meaning)?.sqrt();
        let ql_diag = ql.diagonal();
        let r_diag = r.diagonal();
        let statistics: Vec<f64> = (0..v.len())
            .map(|i| test_statistic(v[i], r_diag[i] * sigma0_squared * ql_diag[i]))
            .collect();
        let results: Vec<bool> = statistics.iter().map(|w| *w < lambda_sqrt).collect();

        let failed = failing_indices(&results);
        if !failed.is_empty() {
            warn!("data snooping rejected observations {failed:?} (sqrt(lambda) = {lambda_sqrt})");
        }

        Ok(Self {
            lambda_sqrt,
            statistics,
            results,
        })
    }

    /// Square root of the non-centrality parameter, the shared threshold.
    pub fn lambda_sqrt(&self) -> f64 {
        self.lambda_sqrt
    }

    /// Normalized residuals, in observation order.
    pub fn statistics(&self) -> &[f64] {
        &self.statistics
    }

    /// Per observation verdict, `true` when no gross error was detected.
    pub fn results(&self) -> &[bool] {
        &self.results
    }

    /// Indices of observations flagged as outliers.
    pub fn rejected(&self) -> Vec<usize> {
        failing_indices(&self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveying::least_squares::Adjustment;

    #[test]
    fn threshold_is_root_of_baarda_bound() {
        let v = DVector::from_vec(vec![0.5]);
        let ql = DMatrix::identity(1, 1);
        let r = DMatrix::from_element(1, 1, 0.5);
        let test = DataSnooping::new(1.0, &v, &ql, &r, 0.001, 0.80).unwrap();
        assert!((test.lambda_sqrt() - 4.1322).abs() < 1e-3);
        assert!((test.statistics()[0] - 0.5 / 0.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(test.results(), &[true]);
    }

    #[test]
    fn flags_blunder() {
        let v = DVector::from_vec(vec![0.2, 3.0, -0.1]);
        let ql = DMatrix::identity(3, 3);
        let r = DMatrix::from_diagonal(&DVector::from_vec(vec![0.5, 0.5, 0.5]));
        let test = DataSnooping::new(1.0, &v, &ql, &r, 0.05, 0.80).unwrap();
        // sqrt(lambda) = 1.96 + 0.84 = 2.80, statistic 3 / sqrt(0.5) = 4.24
        assert_eq!(test.rejected(), vec![1]);
    }

    #[test]
    fn zero_residual_passes() {
        let v = DVector::from_vec(vec![0.0]);
        let ql = DMatrix::identity(1, 1);
        let r = DMatrix::from_element(1, 1, 0.0);
        let test = DataSnooping::new(1.0, &v, &ql, &r, 0.05, 0.80).unwrap();
        assert_eq!(test.results(), &[true]);
    }

    #[test]
    fn uncontrolled_observation_passes() {
        let a = DMatrix::from_row_slice(4, 2, &[1.0, 0.5, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let p = DMatrix::identity(4, 4);
        let f = DVector::from_vec(vec![0.3, 0.1, -0.2, 0.05]);
        let adj = Adjustment::regular(&a, &p, &f).unwrap();
        let test = DataSnooping::new(
            1.0,
            adj.residuals(),
            adj.ql(),
            adj.internal_reliability(),
            0.05,
            0.80,
        )
        .unwrap();
        assert!(test.statistics()[0] < 1e-3);
        assert!(test.results().iter().all(|ok| *ok));
    }

    #[test]
    fn beta_reading_changes_threshold() {
        let v = DVector::from_vec(vec![1.0]);
        let ql = DMatrix::identity(1, 1);
        let r = DMatrix::identity(1, 1);
        let power =
            DataSnooping::with_beta_meaning(1.0, &v, &ql, &r, 0.05, 0.9, BetaMeaning::Power)
                .unwrap();
        let error = DataSnooping::with_beta_meaning(
            1.0,
            &v,
            &ql,
            &r,
            0.05,
            0.9,
            BetaMeaning::TypeIIError,
        )
        .unwrap();
        assert!(power.lambda_sqrt() > error.lambda_sqrt());
    }

    #[test]
    fn validates_shapes_and_probabilities() {
        let v = DVector::from_vec(vec![0.1, 0.2]);
        let ql = DMatrix::identity(2, 2);
        assert!(matches!(
            DataSnooping::new(1.0, &v, &ql, &DMatrix::identity(3, 3), 0.05, 0.8),
            Err(AdjustError::DimensionMismatch(_))
        ));
        assert!(matches!(
            DataSnooping::new(1.0, &v, &ql, &DMatrix::identity(2, 2), 0.05, 0.0),
            Err(AdjustError::Range { name: "beta", .. })
        ));
    }
}
