//! Read-through cache in front of any provider.

use super::cache::SeriesCache;
use super::provider::{DataError, MarketDataProvider};
use crate::domain::Bar;
use chrono::NaiveDate;
use tracing::{debug, warn};

pub struct CachedProvider<P> {
    inner: P,
    cache: SeriesCache,
    offline: bool,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: SeriesCache) -> Self {
        Self {
            inner,
            cache,
            offline: false,
        }
    }

    /// Serve only from the cache; a miss returns an empty series.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        if let Some(bars) = self.cache.load(symbol, start, end)? {
            debug!(symbol, bars = bars.len(), "cache hit");
            return Ok(bars);
        }
        if self.offline {
            debug!(symbol, "cache miss in offline mode");
            return Ok(Vec::new());
        }

        let bars = self.inner.fetch(symbol, start, end)?;
        if !bars.is_empty() {
            // A failed cache write never fails the fetch.
            if let Err(e) = self.cache.store(symbol, start, end, &bars) {
                warn!(symbol, error = %e, "could not cache series");
            }
        }
        Ok(bars)
    }

    fn is_available(&self) -> bool {
        self.offline || self.inner.is_available()
    }
}
