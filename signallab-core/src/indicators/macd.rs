//! Moving Average Convergence Divergence (MACD).
//!
//! Three lines (separate Indicator instances):
//! - MACD: EMA(close, fast) - EMA(close, slow)
//! - MACD_SIGNAL: EMA(MACD, signal), seeded on the first `signal` defined MACD values
//! - MACD_HIST: MACD - MACD_SIGNAL
//!
//! Lookback: slow - 1 for the MACD line, slow + signal - 2 for signal and histogram.

use super::closes_of;
use super::ema::ema_of_series;
use super::indicator::Indicator;
use crate::domain::PriceSeries;

/// Which MACD output to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
}

impl Macd {
    pub const DEFAULT_FAST: usize = 12;
    pub const DEFAULT_SLOW: usize = 26;
    pub const DEFAULT_SIGNAL: usize = 9;

    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow period");
        Self {
            fast,
            slow,
            signal,
            line,
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Macd)
    }

    pub fn signal_line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Histogram)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        match self.line {
            MacdLine::Macd => "MACD",
            MacdLine::Signal => "MACD_SIGNAL",
            MacdLine::Histogram => "MACD_HIST",
        }
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        let closes = closes_of(series);
        let macd = macd_line(&closes, self.fast, self.slow);
        if self.line == MacdLine::Macd {
            return macd;
        }

        let signal = ema_of_series(&macd, self.signal);
        if self.line == MacdLine::Signal {
            return signal;
        }

        macd.iter()
            .zip(&signal)
            .map(|(m, s)| Some((*m)? - (*s)?))
            .collect()
    }
}

fn macd_line(closes: &[Option<f64>], fast: usize, slow: usize) -> Vec<Option<f64>> {
    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);
    fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect()
}
