//! Indicator requests and the engine that turns them into an `IndicatorSet`.

use super::indicator::{Indicator, IndicatorSet};
use super::{Bollinger, Ema, Macd, Rsi, Sma};
use crate::config::ConfigError;
use crate::domain::PriceSeries;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

fn default_macd_fast() -> usize {
    Macd::DEFAULT_FAST
}

fn default_macd_slow() -> usize {
    Macd::DEFAULT_SLOW
}

fn default_macd_signal() -> usize {
    Macd::DEFAULT_SIGNAL
}

fn default_num_std() -> f64 {
    2.0
}

/// A named indicator request with its own window parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorRequest {
    Sma {
        window: usize,
    },
    Ema {
        period: usize,
    },
    Rsi {
        window: usize,
    },
    Macd {
        #[serde(default = "default_macd_fast")]
        fast: usize,
        #[serde(default = "default_macd_slow")]
        slow: usize,
        #[serde(default = "default_macd_signal")]
        signal: usize,
    },
    Bollinger {
        window: usize,
        #[serde(default = "default_num_std")]
        num_std: f64,
    },
}

impl IndicatorRequest {
    pub fn macd() -> Self {
        Self::Macd {
            fast: Macd::DEFAULT_FAST,
            slow: Macd::DEFAULT_SLOW,
            signal: Macd::DEFAULT_SIGNAL,
        }
    }

    /// The requests used when no configuration is given.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::Sma { window: 20 },
            Self::Sma { window: 50 },
            Self::Rsi { window: 14 },
            Self::macd(),
            Self::Bollinger {
                window: 20,
                num_std: 2.0,
            },
        ]
    }

    /// Reject parameters the indicator constructors would panic on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::InvalidParameter(reason));
        match *self {
            Self::Sma { window: 0 } => invalid("sma window must be >= 1".into()),
            Self::Ema { period: 0 } => invalid("ema period must be >= 1".into()),
            Self::Rsi { window: 0 } => invalid("rsi window must be >= 1".into()),
            Self::Macd { fast, slow, signal } => {
                if fast == 0 || signal == 0 {
                    invalid("macd periods must be >= 1".into())
                } else if fast >= slow {
                    invalid(format!("macd fast ({fast}) must be shorter than slow ({slow})"))
                } else {
                    Ok(())
                }
            }
            Self::Bollinger { window, num_std } => {
                if window == 0 {
                    invalid("bollinger window must be >= 1".into())
                } else if !(num_std.is_finite() && num_std >= 0.0) {
                    invalid(format!("bollinger num_std must be >= 0, got {num_std}"))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Names of the series this request produces. Names do not encode
    /// MACD or Bollinger parameters.
    pub fn output_names(&self) -> Vec<String> {
        self.indicators()
            .iter()
            .map(|i| i.name().to_string())
            .collect()
    }

    /// Expand into one indicator instance per output series.
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        match *self {
            Self::Sma { window } => vec![Box::new(Sma::new(window))],
            Self::Ema { period } => vec![Box::new(Ema::new(period))],
            Self::Rsi { window } => vec![Box::new(Rsi::new(window))],
            Self::Macd { fast, slow, signal } => vec![
                Box::new(Macd::line(fast, slow, signal)),
                Box::new(Macd::signal_line(fast, slow, signal)),
                Box::new(Macd::histogram(fast, slow, signal)),
            ],
            Self::Bollinger { window, num_std } => vec![
                Box::new(Bollinger::upper(window, num_std)),
                Box::new(Bollinger::middle(window, num_std)),
                Box::new(Bollinger::lower(window, num_std)),
            ],
        }
    }
}

/// Validate every request and reject lists where two requests would write
/// the same output series.
pub fn check_requests(requests: &[IndicatorRequest]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for request in requests {
        request.validate()?;
        for name in request.output_names() {
            if !seen.insert(name.clone()) {
                return Err(ConfigError::InvalidParameter(format!(
                    "indicator series '{name}' is requested more than once"
                )));
            }
        }
    }
    Ok(())
}

/// Computes every requested indicator once over a price series.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    requests: Vec<IndicatorRequest>,
}

impl IndicatorEngine {
    pub fn new(requests: Vec<IndicatorRequest>) -> Result<Self, ConfigError> {
        check_requests(&requests)?;
        Ok(Self { requests })
    }

    pub fn requests(&self) -> &[IndicatorRequest] {
        &self.requests
    }

    /// Compute all requested indicators.
    ///
    /// Insufficient history or degenerate windows never abort the run: they
    /// leave undefined values and are recorded as diagnostics on the set.
    pub fn compute(&self, series: &PriceSeries) -> IndicatorSet {
        let mut set = IndicatorSet::new(series.len());

        for indicator in self.requests.iter().flat_map(IndicatorRequest::indicators) {
            let (values, diagnostics) = indicator.compute_with_diagnostics(series);
            debug!(
                indicator = indicator.name(),
                defined = values.iter().filter(|v| v.is_some()).count(),
                bars = series.len(),
                "computed indicator"
            );
            for diagnostic in diagnostics {
                warn!(symbol = series.symbol(), "{diagnostic}");
                set.record(diagnostic);
            }
            set.insert(indicator.name(), values);
        }

        set
    }

    /// Maximum lookback across all requested indicators.
    pub fn warmup(&self) -> usize {
        self.requests
            .iter()
            .flat_map(IndicatorRequest::indicators)
            .map(|i| i.lookback())
            .max()
            .unwrap_or(0)
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            requests: IndicatorRequest::defaults(),
        }
    }
}
