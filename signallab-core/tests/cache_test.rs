//! Series cache and provider stack tests against real temp directories.

use chrono::NaiveDate;
use signallab_core::data::{
    cache_key, download_symbols, CachedProvider, CsvPriceProvider, DownloadOutcome,
    MarketDataProvider, SeriesCache,
};
use signallab_core::{AnalysisPipeline, AnalysisRequest, EngineError, SignalLabConfig};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir(tag: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("signallab_it_{tag}_{}_{id}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

/// Write `{dir}/{symbol}.csv` with `n` daily bars from 2024-01-01.
fn write_prices(dir: &std::path::Path, symbol: &str, n: usize) {
    let mut csv = String::from("date,open,high,low,close,volume\n");
    for i in 0..n {
        let day = date(1, 1) + chrono::Duration::days(i as i64);
        let close = 50.0 + (i as f64 * 0.4).sin() * 4.0 + i as f64 * 0.1;
        csv.push_str(&format!(
            "{day},{},{},{},{close},{}\n",
            close - 0.2,
            close + 0.5,
            close - 0.5,
            5000 + i
        ));
    }
    fs::write(dir.join(format!("{symbol}.csv")), csv).unwrap();
}

#[test]
fn csv_provider_through_cache() {
    let csv_dir = temp_dir("csv");
    let cache_dir = temp_dir("cache");
    write_prices(&csv_dir, "ABC", 90);

    let provider = CachedProvider::new(CsvPriceProvider::new(&csv_dir), SeriesCache::new(&cache_dir));
    let first = provider.fetch("ABC", date(1, 10), date(3, 10)).unwrap();
    assert_eq!(first.first().unwrap().date, date(1, 10));
    assert_eq!(first.last().unwrap().date, date(3, 10));

    // Source removed: the second read must come from the cache.
    fs::remove_file(csv_dir.join("ABC.csv")).unwrap();
    let second = provider.fetch("ABC", date(1, 10), date(3, 10)).unwrap();
    assert_eq!(first, second);

    let key = cache_key("ABC", date(1, 10), date(3, 10));
    assert!(cache_dir.join(format!("{key}.parquet")).exists());
    assert!(cache_dir.join(format!("{key}.json")).exists());

    let _ = fs::remove_dir_all(&csv_dir);
    let _ = fs::remove_dir_all(&cache_dir);
}

#[test]
fn offline_analysis_uses_cached_series() {
    let csv_dir = temp_dir("csv");
    let cache_dir = temp_dir("cache");
    write_prices(&csv_dir, "XYZ", 120);

    let summary = download_symbols(
        &CsvPriceProvider::new(&csv_dir),
        &SeriesCache::new(&cache_dir),
        &["XYZ".to_string(), "MISSING".to_string()],
        date(1, 1),
        date(4, 29),
        false,
    );
    assert!(matches!(summary.outcomes[0].1, DownloadOutcome::Stored { bars: 120 }));
    assert!(matches!(summary.outcomes[1].1, DownloadOutcome::Failed(_)));
    assert_eq!(summary.failed(), 1);

    let offline = CachedProvider::new(CsvPriceProvider::new(&csv_dir), SeriesCache::new(&cache_dir))
        .offline(true);
    let pipeline = AnalysisPipeline::from_config(&SignalLabConfig::default().validated().unwrap()).unwrap();

    let cached = AnalysisRequest::new("XYZ", date(1, 1), date(4, 29)).unwrap();
    let report = pipeline.run(&offline, &cached).unwrap();
    assert_eq!(report.dates.len(), 120);

    // A different range is a different key: offline miss → no data.
    let uncached = AnalysisRequest::new("XYZ", date(1, 1), date(4, 30)).unwrap();
    assert!(matches!(
        pipeline.run(&offline, &uncached),
        Err(EngineError::DataUnavailable { .. })
    ));

    let _ = fs::remove_dir_all(&csv_dir);
    let _ = fs::remove_dir_all(&cache_dir);
}

#[test]
fn repeat_download_is_skipped_unless_forced() {
    let csv_dir = temp_dir("csv");
    let cache_dir = temp_dir("cache");
    write_prices(&csv_dir, "ABC", 30);
    let provider = CsvPriceProvider::new(&csv_dir);
    let cache = SeriesCache::new(&cache_dir);
    let symbols = ["ABC".to_string()];

    download_symbols(&provider, &cache, &symbols, date(1, 1), date(1, 30), false);
    let again = download_symbols(&provider, &cache, &symbols, date(1, 1), date(1, 30), false);
    assert!(matches!(again.outcomes[0].1, DownloadOutcome::AlreadyCached));

    let forced = download_symbols(&provider, &cache, &symbols, date(1, 1), date(1, 30), true);
    assert!(matches!(forced.outcomes[0].1, DownloadOutcome::Stored { bars: 30 }));
    assert_eq!(cache.entries().unwrap().len(), 1);

    let _ = fs::remove_dir_all(&csv_dir);
    let _ = fs::remove_dir_all(&cache_dir);
}

#[test]
fn symbol_case_hits_the_same_entry() {
    let csv_dir = temp_dir("csv");
    let cache_dir = temp_dir("cache");
    write_prices(&csv_dir, "SPY", 40);

    let summary = download_symbols(
        &CsvPriceProvider::new(&csv_dir),
        &SeriesCache::new(&cache_dir),
        &["spy".to_string()],
        date(1, 1),
        date(2, 9),
        false,
    );
    assert!(summary.all_succeeded());

    let offline = CachedProvider::new(CsvPriceProvider::new(&csv_dir), SeriesCache::new(&cache_dir))
        .offline(true);
    fs::remove_file(csv_dir.join("SPY.csv")).unwrap();
    assert_eq!(offline.fetch("SPY", date(1, 1), date(2, 9)).unwrap().len(), 40);
    assert_eq!(offline.fetch("spy", date(1, 1), date(2, 9)).unwrap().len(), 40);
    assert_eq!(SeriesCache::new(&cache_dir).status("Spy").unwrap().len(), 1);

    let _ = fs::remove_dir_all(&csv_dir);
    let _ = fs::remove_dir_all(&cache_dir);
}
