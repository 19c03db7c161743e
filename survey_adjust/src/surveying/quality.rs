//! Quality control of an adjustment: configuration and combined report of the
//! global test, the tau test and data snooping.

use serde::{Deserialize, Serialize};

use super::data_snooping::DataSnooping;
use super::distributions::BetaMeaning;
use super::global_test::GlobalTest;
use super::least_squares::{Adjustment, AdjustmentSummary};
use super::tau_test::TauTest;
use crate::error::{check_probability, AdjustError, Result};

/// Settings shared by the statistical tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// A priori variance of unit weight.
    pub sigma0_squared: f64,
    /// Significance level of every test.
    pub alpha: f64,
    /// Power of data snooping, read according to `beta_meaning`.
    pub beta: f64,
    pub beta_meaning: BetaMeaning,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            sigma0_squared: 1.0,
            alpha: 0.05,
            beta: 0.80,
            beta_meaning: BetaMeaning::Power,
        }
    }
}

impl QualityConfig {
    /// Parses and validates a configuration from JSON. Missing fields keep
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: QualityConfig =
            serde_json::from_str(json).map_err(|e| AdjustError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that both probabilities lie in `(0, 1)` and that the a priori
    /// variance is positive.
    pub fn validate(&self) -> Result<()> {
        check_probability("alpha", self.alpha)?;
        check_probability("beta", self.beta)?;
        if !(self.sigma0_squared > 0.0) || !self.sigma0_squared.is_finite() {
            return Err(AdjustError::Range {
                name: "sigma0_squared",
                value: self.sigma0_squared,
                expected: "a positive finite variance",
            });
        }
        Ok(())
    }
}

/// Outcome of all statistical tests applied to one adjustment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub summary: AdjustmentSummary,
    pub global: GlobalTest,
    pub tau: TauTest,
    pub data_snooping: DataSnooping,
}

impl QualityReport {
    /// Runs the global test, the tau test and data snooping on `adjustment`.
    pub fn evaluate(adjustment: &Adjustment, config: &QualityConfig) -> Result<Self> {
        config.validate()?;
        let f = adjustment.redundancy();
        let global = GlobalTest::new(
            config.sigma0_squared,
            adjustment.reference_variance(),
            f,
            config.alpha,
        )?;
        let tau = TauTest::new(
            adjustment.reference_variance(),
            adjustment.residuals(),
            adjustment.qv(),
            config.alpha,
            f,
        )?;
        let data_snooping = DataSnooping::with_beta_meaning(
            config.sigma0_squared,
            adjustment.residuals(),
            adjustment.ql(),
            adjustment.internal_reliability(),
            config.alpha,
            config.beta,
            config.beta_meaning,
        )?;
        Ok(Self {
            summary: adjustment.summary(),
            global,
            tau,
            data_snooping,
        })
    }

    /// Observations rejected by the tau test or by data snooping, ascending.
    pub fn suspect_observations(&self) -> Vec<usize> {
        let mut suspects = self.tau.rejected();
        suspects.extend(self.data_snooping.rejected());
        suspects.sort_unstable();
        suspects.dedup();
        suspects
    }

    /// Renders the report as pretty printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AdjustError::Serialization(e.to_string()))
    }
}
