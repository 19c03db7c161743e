//! Least squares adjustment of geodetic networks with reliability analysis
//! and outlier detection.

pub mod error;
pub mod geometry;
pub mod surveying;

pub use error::{AdjustError, Result};
