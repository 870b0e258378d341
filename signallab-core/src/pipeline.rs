//! Analysis pipeline: fetch → indicators → signals → backtest.

use crate::backtest::{run_backtest, BacktestResult};
use crate::config::{ConfigError, SignalLabConfig};
use crate::data::MarketDataProvider;
use crate::domain::PriceSeries;
use crate::error::EngineError;
use crate::indicators::{closes_of, IndicatorEngine, IndicatorSet};
use crate::signals::{SignalEngine, SignalSeries};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, info_span, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisRequest {
    pub fn new(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvalidParameter(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self {
            symbol: symbol.into(),
            start,
            end,
        })
    }
}

/// Everything the presentation layer needs for one symbol, aligned by index.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub source: String,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<Option<f64>>,
    /// Bars before every requested indicator can be defined.
    pub warmup_bars: usize,
    pub indicators: IndicatorSet,
    pub signals: SignalSeries,
    pub backtest: BacktestResult,
}

pub struct AnalysisPipeline {
    indicators: IndicatorEngine,
    signals: SignalEngine,
}

impl AnalysisPipeline {
    pub fn new(indicators: IndicatorEngine, signals: SignalEngine) -> Self {
        Self { indicators, signals }
    }

    /// Build from a validated config.
    pub fn from_config(config: &SignalLabConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            IndicatorEngine::new(config.indicators.clone())?,
            SignalEngine::new(config.signal.clone())?,
        ))
    }

    pub fn run(
        &self,
        provider: &dyn MarketDataProvider,
        request: &AnalysisRequest,
    ) -> Result<AnalysisReport, EngineError> {
        let _span = info_span!("analyze", symbol = %request.symbol).entered();

        let bars = provider.fetch(&request.symbol, request.start, request.end)?;
        if bars.is_empty() {
            return Err(EngineError::DataUnavailable {
                symbol: request.symbol.clone(),
                start: request.start,
                end: request.end,
            });
        }
        let series = PriceSeries::new(request.symbol.clone(), bars)?;
        self.analyze(&series, provider.name())
    }

    /// Run everything after the fetch on an already validated series.
    pub fn analyze(&self, series: &PriceSeries, source: &str) -> Result<AnalysisReport, EngineError> {
        let warmup_bars = self.indicators.warmup();
        if series.len() <= warmup_bars {
            warn!(
                bars = series.len(),
                warmup = warmup_bars,
                "series is shorter than the indicator warm-up"
            );
        }
        let indicators = self.indicators.compute(series);
        let signals = self.signals.generate(series, &indicators)?;
        let backtest = run_backtest(series, &signals, self.signals.short_policy());

        info!(
            first = %series.first_date(),
            last = %series.last_date(),
            bars = series.len(),
            total_return = backtest.total_return,
            buy_and_hold = backtest.buy_and_hold_return,
            diagnostics = indicators.diagnostics().len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            symbol: series.symbol().to_string(),
            source: source.to_string(),
            dates: series.dates(),
            closes: closes_of(series),
            warmup_bars,
            indicators,
            signals,
            backtest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_series;

    #[test]
    fn rejects_inverted_range() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(AnalysisRequest::new("SPY", start, end).is_err());
    }

    #[test]
    fn analyze_aligns_outputs() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let series = make_series(&closes);
        let config = SignalLabConfig::default().validated().unwrap();
        let report = AnalysisPipeline::from_config(&config)
            .unwrap()
            .analyze(&series, "test")
            .unwrap();

        assert_eq!(report.dates.len(), 40);
        assert_eq!(report.closes.len(), 40);
        assert_eq!(report.signals.len(), 40);
        assert_eq!(report.backtest.returns.len(), 40);
        assert_eq!(report.indicators.series_len(), 40);
        // SMA50 is the longest default lookback.
        assert_eq!(report.warmup_bars, 49);
    }
}
