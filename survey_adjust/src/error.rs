//! Error type shared by the adjustment engine, the statistical tests and the
//! observation model.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Errors raised while building or analysing an adjustment.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdjustError {
    /// Matrix or vector shapes are inconsistent with each other.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A probability or a number of degrees of freedom lies outside its domain.
    #[error("{name} = {value} is out of range, expected {expected}")]
    Range {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// A matrix that has to be inverted is singular.
    #[error("matrix {0} is singular and cannot be inverted")]
    Singular(&'static str),

    /// The observation cannot be linearized or reduced.
    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    /// The statistics library rejected the distribution parameters.
    #[error("distribution error: {0}")]
    Distribution(String),

    /// Quality configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A report could not be rendered as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdjustError>;

pub(crate) fn shape(m: &DMatrix<f64>) -> String {
    format!("{}x{}", m.nrows(), m.ncols())
}

pub(crate) fn vec_shape(v: &DVector<f64>) -> String {
    format!("{}x1", v.len())
}

/// Checks that `value` lies in the open interval `(0, 1)`.
pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(AdjustError::Range {
            name,
            value,
            expected: "0 < value < 1",
        })
    }
}

/// Checks that a number of degrees of freedom is at least one.
pub(crate) fn check_freedom(name: &'static str, value: usize) -> Result<()> {
    if value >= 1 {
        Ok(())
    } else {
        Err(AdjustError::Range {
            name,
            value: value as f64,
            expected: "at least 1",
        })
    }
}
