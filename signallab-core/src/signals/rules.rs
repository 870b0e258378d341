//! Threshold rules that turn indicator values into signal states.

use super::state::{ShortPolicy, SignalState};
use super::{forward_fill, SignalSeries};
use crate::config::ConfigError;
use crate::domain::PriceSeries;
use crate::indicators::{closes_of, IndicatorRequest, IndicatorSet};
use serde::{Deserialize, Serialize};

/// Which rule maps indicators to states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRule {
    /// RSI below `lower` → LONG, above `upper` → SHORT, otherwise carry.
    #[default]
    RsiThreshold,
    /// Close below BB_LOWER → LONG, above BB_UPPER → SHORT, otherwise carry.
    BollingerReversion,
}

/// Signal rule parameters (`[signal]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub rule: SignalRule,
    pub rsi_window: usize,
    pub lower: f64,
    pub upper: f64,
    pub bollinger_window: usize,
    pub bollinger_num_std: f64,
    pub short_policy: ShortPolicy,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rule: SignalRule::RsiThreshold,
            rsi_window: 14,
            lower: 30.0,
            upper: 70.0,
            bollinger_window: 20,
            bollinger_num_std: 2.0,
            short_policy: ShortPolicy::Flat,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lower.is_nan() || self.upper.is_nan() || self.lower >= self.upper {
            return Err(ConfigError::InvalidParameter(format!(
                "signal lower threshold ({}) must be below upper ({})",
                self.lower, self.upper
            )));
        }
        self.required_indicator().validate()
    }

    /// The indicator request the configured rule reads.
    pub fn required_indicator(&self) -> IndicatorRequest {
        match self.rule {
            SignalRule::RsiThreshold => IndicatorRequest::Rsi {
                window: self.rsi_window,
            },
            SignalRule::BollingerReversion => IndicatorRequest::Bollinger {
                window: self.bollinger_window,
                num_std: self.bollinger_num_std,
            },
        }
    }
}

/// Applies the configured rule to an `IndicatorSet`.
#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    config: SignalConfig,
}

impl SignalEngine {
    pub fn new(config: SignalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn short_policy(&self) -> ShortPolicy {
        self.config.short_policy
    }

    /// Produce the signal series for `series` from its indicator set.
    pub fn generate(
        &self,
        series: &PriceSeries,
        indicators: &IndicatorSet,
    ) -> Result<SignalSeries, ConfigError> {
        let lookup = |name: &str| {
            indicators
                .series(name)
                .ok_or_else(|| ConfigError::MissingIndicator(name.to_string()))
        };

        match self.config.rule {
            SignalRule::RsiThreshold => {
                let name = format!("RSI{}", self.config.rsi_window);
                Ok(rsi_threshold(lookup(&name)?, self.config.lower, self.config.upper))
            }
            SignalRule::BollingerReversion => Ok(bollinger_reversion(
                &closes_of(series),
                lookup("BB_UPPER")?,
                lookup("BB_LOWER")?,
            )),
        }
    }
}

/// RSI threshold rule with strict comparisons: exactly `lower` or `upper` carries.
pub fn rsi_threshold(rsi: &[Option<f64>], lower: f64, upper: f64) -> SignalSeries {
    forward_fill(rsi.iter().map(|value| match *value {
        Some(v) if v < lower => Some(SignalState::Long),
        Some(v) if v > upper => Some(SignalState::Short),
        _ => None,
    }))
}

/// Mean-reversion rule on the close's position relative to the bands.
pub fn bollinger_reversion(
    closes: &[Option<f64>],
    upper: &[Option<f64>],
    lower: &[Option<f64>],
) -> SignalSeries {
    forward_fill(
        closes
            .iter()
            .zip(upper.iter().zip(lower))
            .map(|(close, (up, low))| match (*close, *up, *low) {
                (Some(c), _, Some(l)) if c < l => Some(SignalState::Long),
                (Some(c), Some(u), _) if c > u => Some(SignalState::Short),
                _ => None,
            }),
    )
}
