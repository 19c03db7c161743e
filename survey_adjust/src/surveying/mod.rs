//! Surveying specific computations: network linearization, least squares
//! adjustment and statistical quality control.

pub mod least_squares;
pub use least_squares::{Adjustment, AdjustmentSummary};

pub mod distributions;
pub use distributions::{chi_square, fisher, noncentrality_parameter, student, tau, BetaMeaning};

pub use global_test::GlobalTest;

pub use tau_test::TauTest;

pub mod data_snooping;
pub use data_snooping::DataSnooping;

pub mod quality;
pub use quality::{QualityConfig, QualityReport};

pub mod linearization;
pub use linearization::{
    angle_coefficients, azimuth_coefficients, baseline_coefficients, direction_coefficients,
    distance_coefficients, AngleCoefficients, BaselineCoefficients, DirectionCoefficients,
    PairCoefficients,
};

pub mod free_terms;
pub use free_terms::{
    angle_free_term, angle_free_term_from_directions, azimuth_free_term, baseline_free_term,
    baseline_free_terms_2d, baseline_free_terms_3d, direction_free_term, distance_free_term,
    FreeTerm, LengthUnit,
};

pub mod adjustment;
pub use adjustment::{
    adjust_network, Axis, DesignSystem, Network, NetworkAdjustment, NetworkPoint, Observation,
};
