//! Bar — one trading day of prices for a symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar. Missing prices are stored as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// The close, or `None` when the provider had no usable close.
    pub fn close_value(&self) -> Option<f64> {
        self.close.is_finite().then_some(self.close)
    }

    /// Every price field is missing.
    pub fn is_void(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_nan())
    }

    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> bool {
        (start..=end).contains(&self.date)
    }
}
