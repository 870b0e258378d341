//! PriceSeries — an ordered, validated sequence of bars for one symbol.

use super::bar::Bar;
use crate::data::DataError;
use chrono::NaiveDate;
use serde::Serialize;

/// Bars for a single symbol, strictly increasing by date.
///
/// Only constructible through [`PriceSeries::new`], which enforces ordering
/// and non-emptiness. There is no mutable access afterwards: every derived
/// series is computed from a shared borrow and is aligned index-for-index
/// with `bars()`.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, DataError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(DataError::ValidationError(format!(
                "price series for '{symbol}' is empty"
            )));
        }
        if let Some(i) = bars.windows(2).position(|w| w[0].date >= w[1].date) {
            return Err(DataError::ValidationError(format!(
                "price series for '{symbol}' is not strictly increasing at index {}: {} then {}",
                i + 1,
                bars[i].date,
                bars[i + 1].date
            )));
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    /// A new series holding the first `len` bars. Used by look-ahead tests.
    pub fn truncated(&self, len: usize) -> Result<Self, DataError> {
        Self::new(
            self.symbol.clone(),
            self.bars[..len.min(self.bars.len())].to_vec(),
        )
    }
}
