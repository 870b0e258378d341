//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::indicator::Indicator;
use super::closes_of;
use crate::domain::PriceSeries;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("SMA{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        sma_of_series(&closes_of(series), self.period)
    }
}

/// Trailing mean over `period` values, inclusive of the current one.
///
/// A window holding an undefined value is undefined.
pub fn sma_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut undefined_in_window = 0usize;

    for i in 0..n {
        match values[i] {
            Some(v) => sum += v,
            None => undefined_in_window += 1,
        }
        if i >= period {
            match values[i - period] {
                Some(v) => sum -= v,
                None => undefined_in_window -= 1,
            }
        }
        if i + 1 >= period && undefined_in_window == 0 {
            result[i] = Some(sum / period as f64);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let series = make_series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&series);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_none(), "expected undefined at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let series = make_series(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).compute(&series);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_undefined_propagation() {
        let values = [Some(10.0), Some(11.0), None, Some(13.0), Some(14.0), Some(15.0)];
        let result = sma_of_series(&values, 3);
        // Windows touching index 2 are undefined
        assert!(result[2].is_none());
        assert!(result[3].is_none());
        assert!(result[4].is_none());
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_nan_close_is_undefined() {
        let series = make_series(&[10.0, f64::NAN, 12.0, 13.0]);
        let result = Sma::new(2).compute(&series);
        assert!(result[1].is_none());
        assert!(result[2].is_none());
        assert_approx(result[3], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(20).lookback(), 19);
        assert_eq!(Sma::new(1).lookback(), 0);
        assert_eq!(Sma::new(20).name(), "SMA20");
    }

    #[test]
    fn sma_too_few_bars() {
        let series = make_series(&[10.0, 11.0]);
        let sma = Sma::new(5);
        assert!(sma.compute(&series).iter().all(Option::is_none));
        let (_, diagnostics) = sma.compute_with_diagnostics(&series);
        assert_eq!(diagnostics.len(), 1);
    }
}
