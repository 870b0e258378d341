//! Error taxonomy shared by the pipelines.
//!
//! - `DataUnavailable` and `SchemaError` abort a run and are surfaced to the caller.
//! - `ComputationError` raised by a single indicator window is recorded as a
//!   diagnostic next to an undefined value; the rest of the run continues.
//!   Raised by the regression estimator it aborts that run.

use crate::config::ConfigError;
use crate::data::DataError;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Top-level error returned by the analysis and regression pipelines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no data for '{symbol}' between {start} and {end}")]
    DataUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("computation error: {0}")]
    Computation(#[from] ComputationError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Problems with the shape or typing of tabular input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("target column '{column}' not found")]
    MissingTarget { column: String },

    #[error("target column '{column}' is not numeric")]
    NonNumericTarget { column: String },

    #[error("need at least 2 feature columns after excluding the target, found {found}")]
    TooFewFeatures { found: usize },

    #[error("column '{column}' is not numeric after encoding")]
    NonNumericColumn { column: String },

    #[error("column '{column}' not found")]
    UnknownColumn { column: String },

    #[error("prediction row does not match training features: {reason}")]
    PredictionRowMismatch { reason: String },

    #[error("table has no rows")]
    EmptyTable,

    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("csv: {0}")]
    Csv(String),
}

/// Numeric failures. Indicator-level variants are non-fatal diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
pub enum ComputationError {
    #[error("{indicator} needs {required} bars of history, series has {available}")]
    InsufficientHistory {
        indicator: String,
        required: usize,
        available: usize,
    },

    #[error("{indicator} undefined at index {index}: no gains and no losses in window")]
    DegenerateRsi { indicator: String, index: usize },

    #[error("normal equations are singular (collinear or constant features)")]
    SingularMatrix,

    #[error("need at least one training and one held-out row, table has {rows}")]
    InsufficientRows { rows: usize },
}
