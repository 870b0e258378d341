//! Relative Strength Index (RSI).
//!
//! Simple trailing means of gains and losses over `period` price changes.
//! RSI = 100 - 100 / (1 + mean_gain / mean_loss)
//! Lookback: period (needs `period` changes, i.e. `period + 1` closes).
//!
//! Edge cases:
//! - mean_loss == 0, mean_gain > 0 → exactly 100
//! - mean_gain == 0, mean_loss > 0 → exactly 0
//! - both zero (flat window) → undefined, reported as `DegenerateRsi`

use super::closes_of;
use super::indicator::Indicator;
use crate::domain::PriceSeries;
use crate::error::ComputationError;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("RSI{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// RSI values plus the indices of flat (degenerate) windows.
    fn evaluate(&self, series: &PriceSeries) -> (Vec<Option<f64>>, Vec<usize>) {
        let closes = closes_of(series);
        let n = closes.len();
        let mut result = vec![None; n];
        let mut degenerate = Vec::new();

        if n < self.period + 1 {
            return (result, degenerate);
        }

        let changes: Vec<Option<f64>> = std::iter::once(None)
            .chain(closes.windows(2).map(|w| match (w[0], w[1]) {
                (Some(prev), Some(curr)) => Some(curr - prev),
                _ => None,
            }))
            .collect();

        // Each window is summed directly so a flat window yields exact zeros.
        'bars: for i in self.period..n {
            let mut gain = 0.0;
            let mut loss = 0.0;
            for ch in &changes[(i + 1 - self.period)..=i] {
                let Some(ch) = *ch else {
                    continue 'bars;
                };
                if ch > 0.0 {
                    gain += ch;
                } else {
                    loss -= ch;
                }
            }
            let mean_gain = gain / self.period as f64;
            let mean_loss = loss / self.period as f64;

            match rsi_from_means(mean_gain, mean_loss) {
                Some(v) => result[i] = Some(v),
                None => degenerate.push(i),
            }
        }

        (result, degenerate)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        self.evaluate(series).0
    }

    fn compute_with_diagnostics(
        &self,
        series: &PriceSeries,
    ) -> (Vec<Option<f64>>, Vec<ComputationError>) {
        let (values, degenerate) = self.evaluate(series);
        let diagnostics = self
            .history_check(series)
            .into_iter()
            .chain(degenerate.into_iter().map(|index| ComputationError::DegenerateRsi {
                indicator: self.name.clone(),
                index,
            }))
            .collect();
        (values, diagnostics)
    }
}

/// RSI from mean gain and mean loss. `None` when both are zero.
pub fn rsi_from_means(mean_gain: f64, mean_loss: f64) -> Option<f64> {
    if mean_loss == 0.0 && mean_gain == 0.0 {
        None
    } else if mean_loss == 0.0 {
        Some(100.0)
    } else if mean_gain == 0.0 {
        Some(0.0)
    } else {
        Some(100.0 - 100.0 / (1.0 + mean_gain / mean_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series};

    #[test]
    fn rsi_all_gains() {
        let series = make_series(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&series);
        assert_eq!(result[3], Some(100.0));
        assert_eq!(result[5], Some(100.0));
    }

    #[test]
    fn rsi_all_losses() {
        let series = make_series(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&series);
        assert_eq!(result[3], Some(0.0));
    }

    #[test]
    fn rsi_mixed_known_value() {
        // Changes: +0.34, -0.25, -0.48, +0.72
        // Window at 3: gains=0.34, losses=0.73 → RSI = 100 - 100/(1 + 0.34/0.73)
        // Window at 4: gains=0.72, losses=0.73 → RSI = 100 - 100/(1 + 0.72/0.73)
        let series = make_series(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&series);

        assert!(result[..3].iter().all(Option::is_none));
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + 0.72 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_uses_trailing_window_only() {
        // A big early loss leaves the window once it is more than `period` changes old.
        let series = make_series(&[100.0, 90.0, 91.0, 92.0, 93.0]);
        let result = Rsi::new(3).compute(&series);
        assert!(result[3].unwrap() < 100.0);
        assert_eq!(result[4], Some(100.0));
    }

    #[test]
    fn rsi_bounds() {
        let series = make_series(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&series);
        for (i, v) in result.iter().enumerate() {
            if let Some(v) = v {
                assert!((0.0..=100.0).contains(v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_flat_window_is_undefined_and_reported() {
        let series = make_series(&[100.0, 100.0, 100.0, 100.0, 101.0]);
        let rsi = Rsi::new(3);
        let (values, diagnostics) = rsi.compute_with_diagnostics(&series);
        assert!(values[3].is_none());
        assert_eq!(values[4], Some(100.0));
        assert_eq!(
            diagnostics,
            vec![ComputationError::DegenerateRsi {
                indicator: "RSI3".into(),
                index: 3
            }]
        );
    }

    #[test]
    fn rsi_void_close_blanks_touching_windows() {
        let series = make_series(&[100.0, 101.0, f64::NAN, 103.0, 104.0, 105.0, 106.0]);
        let result = Rsi::new(2).compute(&series);
        // Changes at 2 and 3 are undefined; windows ending at 2, 3, 4 touch them.
        assert!(result[2].is_none());
        assert!(result[3].is_none());
        assert!(result[4].is_none());
        assert_eq!(result[5], Some(100.0));
    }

    #[test]
    fn rsi_from_means_edges() {
        assert_eq!(rsi_from_means(0.0, 0.0), None);
        assert_eq!(rsi_from_means(1.0, 0.0), Some(100.0));
        assert_eq!(rsi_from_means(0.0, 1.0), Some(0.0));
        assert_eq!(rsi_from_means(1.0, 1.0), Some(50.0));
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
        assert_eq!(Rsi::new(14).name(), "RSI14");
    }
}
