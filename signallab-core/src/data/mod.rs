//! Price data collaborators: providers, the series cache, and batch download.

pub mod cache;
pub mod cached;
pub mod circuit_breaker;
pub mod csv_provider;
pub mod download;
pub mod provider;
pub mod yahoo;

pub use cache::{cache_key, CacheMeta, SeriesCache};
pub use cached::CachedProvider;
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_provider::CsvPriceProvider;
pub use download::{download_symbols, DownloadOutcome, DownloadSummary};
pub use provider::{normalize_bars, normalize_symbol, DataError, MarketDataProvider};
pub use yahoo::YahooProvider;
