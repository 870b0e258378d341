//! SignalLab Core — indicators, signals, backtest arithmetic, and a small
//! regression estimator.
//!
//! Two independent pipelines:
//! - price series → indicator set → signal states → strategy returns
//! - feature table → one-hot encoding → seeded split → OLS → fit metrics
//!
//! Market data and dataset uploads are collaborators behind the `data`
//! module; everything else is pure computation over borrowed inputs.

pub mod backtest;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod pipeline;
pub mod regression;
pub mod rng;
pub mod signals;

pub use config::{ConfigError, SignalLabConfig};
pub use error::{ComputationError, EngineError, SchemaError};
pub use pipeline::{AnalysisPipeline, AnalysisReport, AnalysisRequest};
