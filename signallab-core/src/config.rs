//! TOML configuration for both pipelines.
//!
//! Every table is optional; a missing file section falls back to defaults.

use crate::indicators::{check_requests, IndicatorRequest};
use crate::regression::RegressionConfig;
use crate::signals::SignalConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("indicator '{0}' was not computed")]
    MissingIndicator(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalLabConfig {
    pub indicators: Vec<IndicatorRequest>,
    pub signal: SignalConfig,
    pub regression: RegressionConfig,
}

impl Default for SignalLabConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorRequest::defaults(),
            signal: SignalConfig::default(),
            regression: RegressionConfig::default(),
        }
    }
}

impl SignalLabConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validated()
    }

    /// Validate all sections and add the indicator the signal rule reads
    /// when no request produces its series yet.
    ///
    /// A request that produces the rule's series with other parameters is
    /// an error: the rule would read bands or lines it was not configured for.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        check_requests(&self.indicators)?;
        self.signal.validate()?;
        self.regression.validate()?;

        let required = self.signal.required_indicator();
        let required_names = required.output_names();
        let existing = self
            .indicators
            .iter()
            .find(|request| {
                request
                    .output_names()
                    .iter()
                    .any(|name| required_names.contains(name))
            })
            .cloned();
        match existing {
            Some(request) if request == required => {}
            Some(request) => {
                return Err(ConfigError::InvalidParameter(format!(
                    "signal rule reads {required:?} but the indicator list requests {request:?} \
                     under the same series names; align [signal] with [[indicators]]"
                )))
            }
            None => self.indicators.push(required),
        }
        Ok(self)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
