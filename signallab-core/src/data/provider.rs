//! Market data provider seam and its error type.
//!
//! Everything that hands daily bars to the analysis pipeline implements
//! `MarketDataProvider`: the Yahoo client, the CSV directory reader, the
//! caching wrapper, and test doubles.

use crate::domain::Bar;
use chrono::NaiveDate;
use thiserror::Error;

/// Failures from fetching, reading, or caching price data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider is refusing requests (circuit breaker open)")]
    CircuitBreakerTripped,

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Source of daily OHLCV bars.
///
/// An empty `Ok` means the source answered but had no bars for the range;
/// callers decide whether that is an error.
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Daily bars for `symbol` with `start <= date <= end`, ascending by date.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError>;

    /// Whether the provider is currently willing to serve requests.
    fn is_available(&self) -> bool {
        true
    }
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        (**self).fetch(symbol, start, end)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Canonical form of a ticker: trimmed and upper-cased. Cache keys and
/// file lookups go through this so `spy` and `SPY` name the same series.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Keep bars inside `[start, end]`, sorted by date with duplicate dates removed.
pub fn normalize_bars(mut bars: Vec<Bar>, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    bars.retain(|b| b.in_range(start, end));
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}
