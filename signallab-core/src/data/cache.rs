//! Content-addressed Parquet cache for fetched price series.
//!
//! Layout: `{cache_dir}/{key}.parquet` plus a `{key}.json` metadata sidecar,
//! where `key` is the BLAKE3 hash of `(symbol, start, end)`.
//!
//! - Writes are atomic (write to `.tmp`, rename into place).
//! - On load the bars are re-hashed against the sidecar; a mismatch or an
//!   unreadable file is quarantined (`.quarantined`) and treated as a miss.

use super::provider::{normalize_symbol, DataError};
use crate::domain::Bar;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const EXPECTED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub key: String,
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bar_count: usize,
    pub data_hash: String,
    pub cached_at: NaiveDateTime,
}

/// Cache key for a request: hex BLAKE3 of the normalized symbol and the
/// inclusive date range.
pub fn cache_key(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(normalize_symbol(symbol).as_bytes());
    hasher.update(b"\0");
    hasher.update(start.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(end.to_string().as_bytes());
    hasher.finalize().to_hex().to_string()
}

pub struct SeriesCache {
    cache_dir: PathBuf,
}

impl SeriesCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{key}.parquet"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{key}.json"))
    }

    /// Store a non-empty series under its request key.
    pub fn store(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        bars: &[Bar],
    ) -> Result<CacheMeta, DataError> {
        if bars.is_empty() {
            return Err(DataError::CacheError("refusing to cache an empty series".into()));
        }
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("create cache dir: {e}")))?;

        let key = cache_key(symbol, start, end);
        let df = bars_to_dataframe(bars)?;
        let path = self.data_path(&key);
        let tmp = path.with_extension("parquet.tmp");
        write_parquet(&df, &tmp)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            key: key.clone(),
            symbol: normalize_symbol(symbol),
            start,
            end,
            bar_count: bars.len(),
            data_hash: hash_bars(bars)?,
            cached_at: chrono::Local::now().naive_local(),
        };
        let json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        let meta_path = self.meta_path(&key);
        let meta_tmp = meta_path.with_extension("json.tmp");
        fs::write(&meta_tmp, json).map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;
        fs::rename(&meta_tmp, &meta_path)
            .map_err(|e| DataError::CacheError(format!("meta rename: {e}")))?;

        debug!(symbol, %start, %end, bars = bars.len(), key = %key, "cached series");
        Ok(meta)
    }

    /// Cached bars for a request, or `None` on a miss.
    ///
    /// Corrupt entries are quarantined and reported as a miss.
    pub fn load(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Vec<Bar>>, DataError> {
        let key = cache_key(symbol, start, end);
        let path = self.data_path(&key);
        if !path.exists() {
            return Ok(None);
        }

        match self.load_verified(&key, &path) {
            Ok(bars) => Ok(Some(bars)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "quarantining corrupt cache entry");
                self.quarantine(&key);
                Ok(None)
            }
        }
    }

    fn load_verified(&self, key: &str, path: &Path) -> Result<Vec<Bar>, DataError> {
        let meta = self
            .read_meta(key)
            .ok_or_else(|| DataError::ValidationError("missing metadata sidecar".into()))?;
        let bars = load_and_validate_parquet(path)?;
        if bars.len() != meta.bar_count {
            return Err(DataError::ValidationError(format!(
                "expected {} bars, found {}",
                meta.bar_count,
                bars.len()
            )));
        }
        if hash_bars(&bars)? != meta.data_hash {
            return Err(DataError::ValidationError("data hash mismatch".into()));
        }
        Ok(bars)
    }

    fn quarantine(&self, key: &str) {
        for path in [self.data_path(key), self.meta_path(key)] {
            if path.exists() {
                let target = PathBuf::from(format!("{}.quarantined", path.display()));
                let _ = fs::rename(&path, target);
            }
        }
    }

    fn read_meta(&self, key: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(key)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Metadata of every entry in the cache, ordered by symbol then range.
    pub fn entries(&self) -> Result<Vec<CacheMeta>, DataError> {
        let dir = match fs::read_dir(&self.cache_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DataError::CacheError(format!("read dir: {e}"))),
        };

        let mut entries = Vec::new();
        for entry in dir {
            let path = entry
                .map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(meta) = self.read_meta(key) {
                entries.push(meta);
            }
        }
        entries.sort_by(|a, b| (&a.symbol, a.start, a.end).cmp(&(&b.symbol, b.start, b.end)));
        Ok(entries)
    }

    /// Cache entries for one symbol.
    pub fn status(&self, symbol: &str) -> Result<Vec<CacheMeta>, DataError> {
        let symbol = normalize_symbol(symbol);
        Ok(self
            .entries()?
            .into_iter()
            .filter(|m| m.symbol == symbol)
            .collect())
    }
}

fn hash_bars(bars: &[Bar]) -> Result<String, DataError> {
    let bytes = serde_json::to_vec(bars)
        .map_err(|e| DataError::CacheError(format!("hash serialization: {e}")))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

fn bars_to_dataframe(bars: &[Bar]) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::default();
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    if let Some(missing) = EXPECTED_COLUMNS.iter().find(|c| df.column(c).is_err()) {
        return Err(DataError::ValidationError(format!("missing column '{missing}'")));
    }
    dataframe_to_bars(&df)
}

fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<Bar>, DataError> {
    let col = |name: &str| {
        df.column(name)
            .map_err(|e| DataError::ParquetError(format!("column '{name}': {e}")))
    };
    let type_err = |name: &str, e: PolarsError| DataError::ParquetError(format!("{name} column type: {e}"));

    let date = col("date")?;
    let open = col("open")?;
    let high = col("high")?;
    let low = col("low")?;
    let close = col("close")?;
    let volume = col("volume")?;

    let date_ca = date.date().map_err(|e| type_err("date", e))?;
    let open_ca = open.f64().map_err(|e| type_err("open", e))?;
    let high_ca = high.f64().map_err(|e| type_err("high", e))?;
    let low_ca = low.f64().map_err(|e| type_err("low", e))?;
    let close_ca = close.f64().map_err(|e| type_err("close", e))?;
    let vol_ca = volume.u64().map_err(|e| type_err("volume", e))?;

    let epoch = NaiveDate::default();
    (0..df.height())
        .map(|i| {
            let days = date_ca
                .get(i)
                .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
            Ok(Bar {
                date: epoch + chrono::Duration::days(i64::from(days)),
                open: open_ca.get(i).unwrap_or(f64::NAN),
                high: high_ca.get(i).unwrap_or(f64::NAN),
                low: low_ca.get(i).unwrap_or(f64::NAN),
                close: close_ca.get(i).unwrap_or(f64::NAN),
                volume: vol_ca.get(i).unwrap_or(0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_cache_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("signallab_cache_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_bars() -> Vec<Bar> {
        vec![
            Bar {
                date: d(2),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0,
                volume: 1000,
            },
            Bar {
                date: d(3),
                open: 101.0,
                high: 103.0,
                low: 100.0,
                close: 102.0,
                volume: 1100,
            },
        ]
    }

    #[test]
    fn key_depends_on_every_field() {
        let base = cache_key("SPY", d(2), d(3));
        assert_eq!(base, cache_key("SPY", d(2), d(3)));
        assert_ne!(base, cache_key("QQQ", d(2), d(3)));
        assert_ne!(base, cache_key("SPY", d(1), d(3)));
        assert_ne!(base, cache_key("SPY", d(2), d(4)));
    }

    #[test]
    fn store_and_load_roundtrip() {
        let dir = temp_cache_dir();
        let cache = SeriesCache::new(&dir);

        let meta = cache.store("SPY", d(1), d(5), &sample_bars()).unwrap();
        assert_eq!(meta.bar_count, 2);

        let loaded = cache.load("SPY", d(1), d(5)).unwrap().unwrap();
        assert_eq!(loaded, sample_bars());
        assert!(cache.load("SPY", d(1), d(6)).unwrap().is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_series_is_not_stored() {
        let dir = temp_cache_dir();
        let cache = SeriesCache::new(&dir);
        assert!(cache.store("SPY", d(1), d(5), &[]).is_err());
        assert!(cache.entries().unwrap().is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_is_quarantined() {
        let dir = temp_cache_dir();
        let cache = SeriesCache::new(&dir);
        cache.store("SPY", d(1), d(5), &sample_bars()).unwrap();

        let key = cache_key("SPY", d(1), d(5));
        fs::write(dir.join(format!("{key}.parquet")), b"not parquet").unwrap();

        assert!(cache.load("SPY", d(1), d(5)).unwrap().is_none());
        assert!(dir.join(format!("{key}.parquet.quarantined")).exists());
        assert!(!dir.join(format!("{key}.parquet")).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn entries_and_status() {
        let dir = temp_cache_dir();
        let cache = SeriesCache::new(&dir);
        assert!(cache.entries().unwrap().is_empty());

        cache.store("SPY", d(1), d(5), &sample_bars()).unwrap();
        cache.store("QQQ", d(1), d(5), &sample_bars()).unwrap();

        let all = cache.entries().unwrap();
        let symbols: Vec<&str> = all.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["QQQ", "SPY"]);
        assert_eq!(cache.status("SPY").unwrap().len(), 1);
        assert!(cache.status("IWM").unwrap().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn symbol_case_does_not_split_entries() {
        let dir = temp_cache_dir();
        let cache = SeriesCache::new(&dir);
        let meta = cache.store("spy", d(1), d(5), &sample_bars()).unwrap();

        assert_eq!(meta.symbol, "SPY");
        assert_eq!(cache_key("spy", d(1), d(5)), cache_key("SPY", d(1), d(5)));
        assert_eq!(cache.load("SPY", d(1), d(5)).unwrap(), Some(sample_bars()));
        assert_eq!(cache.status("spy").unwrap().len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
