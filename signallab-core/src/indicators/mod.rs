//! Indicator engine: rolling-window statistics over a `PriceSeries`.
//!
//! Every indicator implements [`Indicator`] and produces a series of
//! `Option<f64>` aligned with the input bars. `None` marks an undefined value
//! (warm-up, a void close in the window, or a degenerate RSI window); it is
//! never replaced by zero.
//!
//! Multi-series indicators (MACD, Bollinger) are exposed as separate named
//! instances per output line, keeping the single-series trait unchanged.

pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod indicator;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand};
pub use ema::Ema;
pub use engine::{check_requests, IndicatorEngine, IndicatorRequest};
pub use indicator::{Indicator, IndicatorSet, NamedSeries};
pub use macd::{Macd, MacdLine};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::{Bar, PriceSeries};

/// Close prices as an optional series: NaN closes (void bars) become `None`.
pub fn closes_of(series: &PriceSeries) -> Vec<Option<f64>> {
    series
        .bars()
        .iter()
        .map(Bar::close_value)
        .collect()
}

/// Create a synthetic series from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect();
    PriceSeries::new("TEST", bars).unwrap()
}

/// Assert a defined value is approximately equal to `expected`.
#[cfg(test)]
pub fn assert_approx(actual: Option<f64>, expected: f64, epsilon: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got undefined"));
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
