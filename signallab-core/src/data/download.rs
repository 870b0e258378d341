//! Batch download of several symbols into the series cache.

use super::cache::SeriesCache;
use super::provider::{DataError, MarketDataProvider};
use chrono::NaiveDate;
use tracing::{info, warn};

#[derive(Debug)]
pub enum DownloadOutcome {
    Stored { bars: usize },
    AlreadyCached,
    Empty,
    Failed(DataError),
}

#[derive(Debug)]
pub struct DownloadSummary {
    pub outcomes: Vec<(String, DownloadOutcome)>,
}

impl DownloadSummary {
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, DownloadOutcome::Failed(_) | DownloadOutcome::Empty))
            .count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Fetch each symbol for `[start, end]` and store non-empty results.
///
/// Symbols already cached for the same range are skipped unless `force`.
/// Once the provider stops being available the remaining symbols are
/// marked failed without another request.
pub fn download_symbols(
    provider: &dyn MarketDataProvider,
    cache: &SeriesCache,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
) -> DownloadSummary {
    let mut outcomes = Vec::with_capacity(symbols.len());

    for (i, symbol) in symbols.iter().enumerate() {
        if !provider.is_available() {
            warn!(remaining = symbols.len() - i, "provider unavailable, stopping batch");
            outcomes.extend(
                symbols[i..]
                    .iter()
                    .map(|s| (s.clone(), DownloadOutcome::Failed(DataError::CircuitBreakerTripped))),
            );
            break;
        }

        let outcome = download_one(provider, cache, symbol, start, end, force);
        match &outcome {
            DownloadOutcome::Stored { bars } => info!(symbol = %symbol, bars, "downloaded"),
            DownloadOutcome::AlreadyCached => info!(symbol = %symbol, "already cached"),
            DownloadOutcome::Empty => warn!(symbol = %symbol, "provider returned no bars"),
            DownloadOutcome::Failed(e) => warn!(symbol = %symbol, error = %e, "download failed"),
        }
        outcomes.push((symbol.clone(), outcome));
    }

    DownloadSummary { outcomes }
}

fn download_one(
    provider: &dyn MarketDataProvider,
    cache: &SeriesCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
) -> DownloadOutcome {
    if !force {
        if let Ok(Some(_)) = cache.load(symbol, start, end) {
            return DownloadOutcome::AlreadyCached;
        }
    }
    let bars = match provider.fetch(symbol, start, end) {
        Ok(bars) => bars,
        Err(e) => return DownloadOutcome::Failed(e),
    };
    if bars.is_empty() {
        return DownloadOutcome::Empty;
    }
    match cache.store(symbol, start, end, &bars) {
        Ok(meta) => DownloadOutcome::Stored {
            bars: meta.bar_count,
        },
        Err(e) => DownloadOutcome::Failed(e),
    }
}
