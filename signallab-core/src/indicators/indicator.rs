//! Indicator trait and the `IndicatorSet` container.
//!
//! Indicators are pure functions: price history in, optional numeric series out.
//! They are computed once per run; nothing is recomputed per bar.

use crate::domain::PriceSeries;
use crate::error::ComputationError;
use serde::Serialize;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Output name (e.g. "SMA20", "RSI14", "BB_UPPER").
    fn name(&self) -> &str;

    /// Index of the first bar that can hold a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    ///
    /// Returns a vector of the same length as `series`; the first
    /// `lookback()` entries are `None`.
    fn compute(&self, series: &PriceSeries) -> Vec<Option<f64>>;

    /// Compute values together with non-fatal diagnostics.
    ///
    /// The default reports `InsufficientHistory` when the series is too short
    /// to produce a single defined value.
    fn compute_with_diagnostics(
        &self,
        series: &PriceSeries,
    ) -> (Vec<Option<f64>>, Vec<ComputationError>) {
        let values = self.compute(series);
        (values, self.history_check(series).into_iter().collect())
    }

    fn history_check(&self, series: &PriceSeries) -> Option<ComputationError> {
        let required = self.lookback() + 1;
        (series.len() < required).then(|| ComputationError::InsufficientHistory {
            indicator: self.name().to_string(),
            required,
            available: series.len(),
        })
    }
}

/// One named output series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Named indicator series aligned with a `PriceSeries`, in request order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndicatorSet {
    len: usize,
    series: Vec<NamedSeries>,
    diagnostics: Vec<ComputationError>,
}

impl IndicatorSet {
    /// An empty set for a price series of `len` bars.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            ..Self::default()
        }
    }

    /// Insert a named series, replacing any previous series with the same name.
    ///
    /// # Panics
    /// If `values` is not aligned with the source series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        let name = name.into();
        assert_eq!(
            values.len(),
            self.len,
            "indicator '{name}' produced {} values for {} bars",
            values.len(),
            self.len
        );
        match self.series.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.values = values,
            None => self.series.push(NamedSeries { name, values }),
        }
    }

    pub fn record(&mut self, diagnostic: ComputationError) {
        self.diagnostics.push(diagnostic);
    }

    /// Defined value of `name` at `index`; `None` if undefined, unknown or out of range.
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series(name).and_then(|v| v.get(index).copied().flatten())
    }

    /// The full series for a named indicator.
    pub fn series(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedSeries> {
        self.series.iter()
    }

    pub fn diagnostics(&self) -> &[ComputationError] {
        &self.diagnostics
    }

    /// Length of the source price series every entry is aligned with.
    pub fn series_len(&self) -> usize {
        self.len
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
