//! End-to-end regression run: validate, encode, split, fit, score.

use super::encoder::{FeatureEncoder, PredictionRow};
use super::metrics::FitMetrics;
use super::ols::LinearRegression;
use super::split::train_test_split;
use super::table::{FeatureColumn, FeatureTable};
use super::RegressionConfig;
use crate::error::{EngineError, SchemaError};
use ndarray::{Array1, Axis};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub feature: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeldOutPoint {
    pub actual: f64,
    pub predicted: f64,
}

/// Scores and fitted parameters of one regression run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionReport {
    pub target: String,
    /// Held-out R².
    pub r2: f64,
    /// Held-out RMSE.
    pub rmse: f64,
    pub mae: f64,
    pub train_r2: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub intercept: f64,
    pub coefficients: Vec<Coefficient>,
    /// Encoded columns that were constant or collinear; their coefficient is 0.
    pub dropped_features: Vec<String>,
    pub held_out: Vec<HeldOutPoint>,
}

/// A trained model. Owns the encoder learned at fit time so every
/// prediction is encoded the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionModel {
    target: String,
    encoder: FeatureEncoder,
    ols: LinearRegression,
    default_row: PredictionRow,
}

impl RegressionModel {
    pub fn predict(&self, row: &PredictionRow) -> Result<f64, SchemaError> {
        let encoded = Array1::from(self.encoder.encode_row(row)?);
        Ok(self.ols.predict_one(encoded.view()))
    }

    /// Mean of each numeric feature and mode of each categorical feature
    /// over the full table.
    pub fn default_row(&self) -> PredictionRow {
        self.default_row.clone()
    }

    /// Apply a `column=value` override to `row`.
    pub fn apply_override(&self, row: &mut PredictionRow, assignment: &str) -> Result<(), SchemaError> {
        let (column, raw) =
            assignment
                .split_once('=')
                .ok_or_else(|| SchemaError::PredictionRowMismatch {
                    reason: format!("override '{assignment}' is not column=value"),
                })?;
        let column = column.trim();
        let value = self.encoder.parse_value(column, raw)?;
        row.set(column, value);
        Ok(())
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn feature_names(&self) -> &[String] {
        self.encoder.encoded_names()
    }

    pub fn coefficients(&self) -> impl Iterator<Item = (&str, f64)> {
        self.feature_names()
            .iter()
            .map(String::as_str)
            .zip(self.ols.coefficients().iter().copied())
    }

    pub fn intercept(&self) -> f64 {
        self.ols.intercept()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedRegression {
    pub model: RegressionModel,
    pub report: RegressionReport,
}

#[derive(Debug, Clone, Default)]
pub struct RegressionEstimator {
    config: RegressionConfig,
}

impl RegressionEstimator {
    pub fn new(config: RegressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegressionConfig {
        &self.config
    }

    pub fn fit(&self, table: &FeatureTable, target: &str) -> Result<FittedRegression, EngineError> {
        self.config.validate()?;
        let y = validate_table(table, target)?;

        let encoder = FeatureEncoder::fit(table, target, self.config.categorical.as_deref())?;
        let x = encoder.encode_table(table)?;
        debug!(
            rows = table.rows(),
            encoded = encoder.encoded_names().len(),
            "encoded feature table"
        );

        let split = train_test_split(table.rows(), self.config.test_fraction, self.config.seed)?;
        let x_train = x.select(Axis(0), &split.train);
        let y_train = y.select(Axis(0), &split.train);
        let x_test = x.select(Axis(0), &split.test);
        let y_test = y.select(Axis(0), &split.test);

        let ols = LinearRegression::fit(&x_train, &y_train)?;
        let dropped_features: Vec<String> = ols
            .dropped()
            .iter()
            .map(|&i| encoder.encoded_names()[i].clone())
            .collect();
        if !dropped_features.is_empty() {
            warn!(dropped = ?dropped_features, "features without independent signal fixed at 0");
        }

        let train_fit = FitMetrics::calculate(&y_train, &ols.predict(&x_train));
        let test_pred = ols.predict(&x_test);
        let test_fit = FitMetrics::calculate(&y_test, &test_pred);
        info!(
            column = target,
            r2 = test_fit.r2,
            rmse = test_fit.rmse,
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            "regression fitted"
        );

        let report = RegressionReport {
            target: target.to_string(),
            r2: test_fit.r2,
            rmse: test_fit.rmse,
            mae: test_fit.mae,
            train_r2: train_fit.r2,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            intercept: ols.intercept(),
            coefficients: encoder
                .encoded_names()
                .iter()
                .zip(ols.coefficients().iter())
                .map(|(feature, &value)| Coefficient {
                    feature: feature.clone(),
                    value,
                })
                .collect(),
            dropped_features,
            held_out: y_test
                .iter()
                .zip(test_pred.iter())
                .map(|(&actual, &predicted)| HeldOutPoint { actual, predicted })
                .collect(),
        };

        let model = RegressionModel {
            target: target.to_string(),
            default_row: encoder.default_row(),
            encoder,
            ols,
        };
        Ok(FittedRegression { model, report })
    }
}

/// Check the table shape and return the target column.
fn validate_table(table: &FeatureTable, target: &str) -> Result<Array1<f64>, SchemaError> {
    if table.rows() == 0 {
        return Err(SchemaError::EmptyTable);
    }
    let y = match table.column(target) {
        None => {
            return Err(SchemaError::MissingTarget {
                column: target.to_string(),
            })
        }
        Some(FeatureColumn::Text(_)) => {
            return Err(SchemaError::NonNumericTarget {
                column: target.to_string(),
            })
        }
        Some(FeatureColumn::Numeric(values)) => Array1::from(values.clone()),
    };
    let features = table.names().len() - 1;
    if features < 2 {
        return Err(SchemaError::TooFewFeatures { found: features });
    }
    Ok(y)
}
