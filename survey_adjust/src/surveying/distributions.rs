//! Critical values of the distributions used when testing adjustments.
//!
//! Every function takes a significance level `alpha` in `(0, 1)` and returns
//! the quantile at `1 - alpha` unless stated otherwise.

use crate::error::{check_freedom, check_probability, AdjustError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// How the `beta` argument of [`noncentrality_parameter`] is read.
///
/// Literature writes Baarda's bound with either the power of the test or the
/// probability of a type II error; both forms are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetaMeaning {
    /// `beta` is the power of the test, e.g. `0.80`.
    #[default]
    Power,
    /// `beta` is the probability of a type II error, e.g. `0.20`.
    #[serde(rename = "type_ii_error")]
    TypeIIError,
}

fn distribution_error(e: impl std::fmt::Display) -> AdjustError {
    AdjustError::Distribution(e.to_string())
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(distribution_error)
}

fn student_quantile(freedom: usize, p: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, freedom as f64).map_err(distribution_error)?;
    Ok(dist.inverse_cdf(p))
}

/// Inverse Fisher-Snedecor distribution with `f1` and `f2` degrees of freedom.
pub fn fisher(alpha: f64, f1: usize, f2: usize) -> Result<f64> {
    check_probability("alpha", alpha)?;
    check_freedom("f1", f1)?;
    check_freedom("f2", f2)?;
    let dist = FisherSnedecor::new(f1 as f64, f2 as f64).map_err(distribution_error)?;
    Ok(dist.inverse_cdf(1.0 - alpha))
}

/// Inverse chi-square distribution with `f` degrees of freedom.
pub fn chi_square(alpha: f64, f: usize) -> Result<f64> {
    check_probability("alpha", alpha)?;
    check_freedom("f", f)?;
    let dist = ChiSquared::new(f as f64).map_err(distribution_error)?;
    Ok(dist.inverse_cdf(1.0 - alpha))
}

/// Inverse Student t distribution with `f` degrees of freedom.
pub fn student(alpha: f64, f: usize) -> Result<f64> {
    check_probability("alpha", alpha)?;
    check_freedom("f", f)?;
    student_quantile(f, 1.0 - alpha)
}

/// Critical value of the tau distribution of internally studentized
/// residuals (Pope, 1976).
///
/// `tau = t √f / √(f - 1 + t²)` with `t` the two-sided Student quantile at
/// `f - 1` degrees of freedom. With a single degree of freedom every
/// studentized residual is `±1` whatever the data, the test cannot
/// discriminate and the critical value is infinite.
pub fn tau(alpha: f64, f: usize) -> Result<f64> {
    check_probability("alpha", alpha)?;
    check_freedom("f", f)?;
    if f == 1 {
        return Ok(f64::INFINITY);
    }
    let t = student_quantile(f - 1, 1.0 - alpha / 2.0)?;
    let f = f as f64;
    Ok(t * f.sqrt() / (f - 1.0 + t * t).sqrt())
}

/// Non-centrality parameter λ of Baarda's B-method for significance `alpha`
/// and test power `beta`, `(Φ⁻¹(1 - α/2) + Φ⁻¹(β))²`.
///
/// With [`BetaMeaning::TypeIIError`] the second quantile is taken at `1 - β`.
pub fn noncentrality_parameter(alpha: f64, beta: f64, meaning: BetaMeaning) -> Result<f64> {
    check_probability("alpha", alpha)?;
    check_probability("beta", beta)?;
    let normal = standard_normal()?;
    let power = match meaning {
        BetaMeaning::Power => beta,
        BetaMeaning::TypeIIError => 1.0 - beta,
    };
    Ok((normal.inverse_cdf(1.0 - alpha / 2.0) + normal.inverse_cdf(power)).powi(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chi_square_quantiles() {
        assert!((chi_square(0.05, 1).unwrap() - 3.841).abs() < 1e-2);
        assert!((chi_square(0.025, 10).unwrap() - 20.483).abs() < 1e-2);
        assert!((chi_square(0.975, 10).unwrap() - 3.247).abs() < 1e-2);
    }

    #[test]
    fn student_quantiles() {
        assert!((student(0.05, 10).unwrap() - 1.812).abs() < 1e-3);
        assert!((student(0.025, 9).unwrap() - 2.262).abs() < 1e-3);
    }

    #[test]
    fn fisher_quantile() {
        assert!((fisher(0.05, 1, 10).unwrap() - 4.965).abs() < 1e-2);
    }

    #[test]
    fn tau_critical_value() {
        let t = tau(0.05, 10).unwrap();
        assert!((t - 1.9039).abs() < 1e-3);
        assert!(t < 10f64.sqrt());
        assert_eq!(tau(0.05, 1).unwrap(), f64::INFINITY);
    }

    #[test]
    fn baarda_bound() {
        let lambda = noncentrality_parameter(0.001, 0.80, BetaMeaning::Power).unwrap();
        assert!((lambda - 17.07).abs() < 1e-2);
        let same = noncentrality_parameter(0.001, 0.20, BetaMeaning::TypeIIError).unwrap();
        assert!((lambda - same).abs() < 1e-9);
        // the two readings coincide at one half
        let a = noncentrality_parameter(0.05, 0.5, BetaMeaning::Power).unwrap();
        let b = noncentrality_parameter(0.05, 0.5, BetaMeaning::TypeIIError).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_arguments() {
        assert!(matches!(chi_square(0.0, 5), Err(AdjustError::Range { name: "alpha", .. })));
        assert!(matches!(chi_square(0.05, 0), Err(AdjustError::Range { name: "f", .. })));
        assert!(matches!(student(1.0, 5), Err(AdjustError::Range { .. })));
        assert!(matches!(fisher(0.05, 0, 5), Err(AdjustError::Range { name: "f1", .. })));
        assert!(matches!(tau(-0.1, 5), Err(AdjustError::Range { .. })));
        assert!(matches!(
            noncentrality_parameter(0.05, 1.5, BetaMeaning::Power),
            Err(AdjustError::Range { name: "beta", .. })
        ));
    }
}
