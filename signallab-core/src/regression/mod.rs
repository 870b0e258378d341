//! Regression estimator — one-hot encoding, seeded split, OLS, fit metrics.
//!
//! Runs independently of the price pipeline: a feature table and a target
//! column go in, a fitted model and a held-out report come out.

pub mod encoder;
pub mod estimator;
pub mod metrics;
pub mod ols;
pub mod split;
pub mod table;

pub use encoder::{FeatureEncoder, FeatureValue, PredictionRow};
pub use estimator::{
    Coefficient, FittedRegression, HeldOutPoint, RegressionEstimator, RegressionModel,
    RegressionReport,
};
pub use metrics::FitMetrics;
pub use ols::LinearRegression;
pub use split::{train_test_split, TrainTestSplit};
pub use table::{FeatureColumn, FeatureTable};

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Share of rows held out for scoring, rounded up to whole rows.
    pub test_fraction: f64,
    pub seed: u64,
    /// Columns to one-hot encode. Unset means every text column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical: Option<Vec<String>>,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            categorical: None,
        }
    }
}

impl RegressionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "regression.test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }
}
