//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1).
//! Seed: simple mean of the first `period` defined values.
//! Lookback: period - 1.

use super::closes_of;
use super::indicator::Indicator;
use crate::domain::PriceSeries;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("EMA{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        ema_of_series(&closes_of(series), self.period)
    }
}

/// EMA of an arbitrary optional series.
///
/// Leading undefined values are skipped, so the EMA of a derived series
/// (e.g. the MACD line) is seeded on its first `period` defined values.
/// An undefined value inside the seed window, or after it, leaves the rest of
/// the output undefined.
pub fn ema_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    let Some(start) = values.iter().position(Option::is_some) else {
        return result;
    };
    if period == 0 || n - start < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    let mut sum = 0.0;
    for v in &values[start..start + period] {
        match v {
            Some(v) => sum += v,
            None => return result,
        }
    }
    let seed_index = start + period - 1;
    let mut prev = sum / period as f64;
    result[seed_index] = Some(prev);

    for i in (seed_index + 1)..n {
        let Some(x) = values[i] else {
            return result;
        };
        prev = alpha * x + (1.0 - alpha) * prev;
        result[i] = Some(prev);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_close() {
        let series = make_series(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&series);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5, seed at index 2: SMA(10,11,12) = 11.0
        // EMA[3] = 0.5*13 + 0.5*11 = 12.0
        // EMA[4] = 0.5*14 + 0.5*12 = 13.0
        let series = make_series(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Ema::new(3).compute(&series);

        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_skips_leading_undefined() {
        let values = [None, None, Some(10.0), Some(11.0), Some(12.0), Some(13.0)];
        let result = ema_of_series(&values, 3);
        assert!(result[..4].iter().all(Option::is_none));
        assert_approx(result[4], 11.0, DEFAULT_EPSILON);
        assert_approx(result[5], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_undefined_in_seed_produces_all_undefined() {
        let values = [Some(10.0), None, Some(12.0), Some(13.0), Some(14.0)];
        let result = ema_of_series(&values, 3);
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn ema_undefined_after_seed_propagates() {
        let values = [Some(10.0), Some(11.0), Some(12.0), None, Some(14.0)];
        let result = ema_of_series(&values, 3);
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert!(result[3].is_none());
        assert!(result[4].is_none());
    }

    #[test]
    fn ema_lookback() {
        assert_eq!(Ema::new(20).lookback(), 19);
        assert_eq!(Ema::new(1).lookback(), 0);
    }
}
