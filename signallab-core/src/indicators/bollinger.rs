//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - BB_MIDDLE: SMA(close, period)
//! - BB_UPPER: middle + mult * stddev(close, period)
//! - BB_LOWER: middle - mult * stddev(close, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use super::closes_of;
use super::indicator::Indicator;
use crate::domain::PriceSeries;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        assert!(multiplier >= 0.0, "Bollinger multiplier must be >= 0");
        Self {
            period,
            multiplier,
            band,
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Lower)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        match self.band {
            BollingerBand::Upper => "BB_UPPER",
            BollingerBand::Middle => "BB_MIDDLE",
            BollingerBand::Lower => "BB_LOWER",
        }
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        let closes = closes_of(series);
        let n = closes.len();
        let mut result = vec![None; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window: Option<Vec<f64>> = closes[(i + 1 - self.period)..=i].iter().copied().collect();
            let Some(window) = window else {
                continue;
            };

            let mean = window.iter().sum::<f64>() / self.period as f64;
            if self.band == BollingerBand::Middle {
                result[i] = Some(mean);
                continue;
            }

            let variance = window
                .iter()
                .map(|close| {
                    let diff = close - mean;
                    diff * diff
                })
                .sum::<f64>()
                / self.period as f64;
            let width = self.multiplier * variance.sqrt();

            result[i] = Some(match self.band {
                BollingerBand::Upper => mean + width,
                _ => mean - width,
            });
        }

        result
    }
}
