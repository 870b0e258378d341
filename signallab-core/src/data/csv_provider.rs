//! Offline provider reading `{dir}/{SYMBOL}.csv` files.
//!
//! Expected header: `date,open,high,low,close,volume` (case-insensitive,
//! extra columns ignored). Dates are `YYYY-MM-DD`.

use super::provider::{normalize_bars, normalize_symbol, DataError, MarketDataProvider};
use crate::domain::Bar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "High")]
    high: Option<f64>,
    #[serde(alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

impl From<CsvRow> for Bar {
    fn from(row: CsvRow) -> Self {
        Bar {
            date: row.date,
            open: row.open.unwrap_or(f64::NAN),
            high: row.high.unwrap_or(f64::NAN),
            low: row.low.unwrap_or(f64::NAN),
            close: row.close.unwrap_or(f64::NAN),
            volume: row.volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
        }
    }
}

/// Parse OHLCV rows from any reader. Blank price cells become undefined.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader
        .deserialize::<CsvRow>()
        .map(|row| row.map(Bar::from).map_err(|e| DataError::Csv(e.to_string())))
        .collect()
}

pub struct CsvPriceProvider {
    dir: PathBuf,
}

impl CsvPriceProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", normalize_symbol(symbol)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MarketDataProvider for CsvPriceProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(symbol);
        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            Err(e) => return Err(DataError::Csv(format!("open {}: {e}", path.display()))),
        };
        let bars = normalize_bars(read_bars(file)?, start, end);
        debug!(symbol, path = %path.display(), bars = bars.len(), "read csv prices");
        Ok(bars)
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
