//! SignalLab CLI — download, analyze, regress, and cache inspection commands.
//!
//! Commands:
//! - `download` — fetch daily bars from Yahoo Finance into the Parquet cache
//! - `analyze` — indicators, signals and a backtest for one symbol
//! - `regress` — fit OLS on a CSV table and predict one row
//! - `cache status` — list cached series

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use signallab_core::data::{
    download_symbols, normalize_symbol, CachedProvider, CircuitBreaker, CsvPriceProvider,
    DownloadOutcome, MarketDataProvider, SeriesCache, YahooProvider,
};
use signallab_core::regression::{
    FeatureTable, FeatureValue, PredictionRow, RegressionEstimator, RegressionReport,
};
use signallab_core::{AnalysisPipeline, AnalysisReport, AnalysisRequest, SignalLabConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "signallab",
    about = "SignalLab CLI — technical indicators, signal backtests and OLS regression"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily bars from Yahoo Finance into the cache.
    Download {
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Re-download even if the range is cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Compute indicators, signals and a backtest for one symbol.
    Analyze {
        #[arg(long)]
        symbol: String,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read `{SYMBOL}.csv` files from this directory instead of Yahoo.
        #[arg(long, conflicts_with = "offline")]
        csv_dir: Option<PathBuf>,

        /// Use only cached data; no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Write the full report as JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Fit a linear regression on a CSV table and predict one row.
    Regress {
        /// CSV file with a header row.
        #[arg(long)]
        data: PathBuf,

        /// Target column name.
        #[arg(long)]
        target: String,

        /// TOML config file (`[regression]` section).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Feature override for the prediction row, `column=value`. Repeatable.
        #[arg(long = "set", value_name = "COLUMN=VALUE")]
        overrides: Vec<String>,

        /// Write the report and prediction as JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Cache inspection.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached series with their ranges and sizes.
    Status {
        /// Only show entries for this symbol.
        #[arg(long)]
        symbol: Option<String>,

        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            symbols,
            start,
            end,
            force,
            cache_dir,
        } => run_download(symbols, start, end, force, cache_dir),
        Commands::Analyze {
            symbol,
            start,
            end,
            config,
            csv_dir,
            offline,
            cache_dir,
            json,
        } => run_analyze(AnalyzeArgs {
            symbol,
            start,
            end,
            config,
            csv_dir,
            offline,
            cache_dir,
            json,
        }),
        Commands::Regress {
            data,
            target,
            config,
            overrides,
            json,
        } => run_regress(&data, &target, config.as_deref(), &overrides, json.as_deref()),
        Commands::Cache { action } => match action {
            CacheAction::Status { symbol, cache_dir } => run_cache_status(&cache_dir, symbol.as_deref()),
        },
    }
}

fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or_else(|| chrono::Local::now().date_naive());
    let start = start.unwrap_or_else(|| end - chrono::Duration::days(365));
    (start, end)
}

fn load_config(path: Option<&Path>) -> Result<SignalLabConfig> {
    let config = match path {
        Some(path) => SignalLabConfig::from_file(path)?,
        None => SignalLabConfig::default().validated()?,
    };
    debug!(?config, "loaded config");
    Ok(config)
}

fn yahoo() -> Result<YahooProvider> {
    Ok(YahooProvider::new(Arc::new(CircuitBreaker::default()))?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    println!("Report written to: {}", path.display());
    Ok(())
}

fn run_download(
    symbols: Vec<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    let (start, end) = date_range(start, end);
    let symbols: Vec<String> = symbols.iter().map(|s| normalize_symbol(s)).collect();
    let provider = yahoo()?;
    let cache = SeriesCache::new(cache_dir);

    let summary = download_symbols(&provider, &cache, &symbols, start, end, force);
    for (symbol, outcome) in &summary.outcomes {
        match outcome {
            DownloadOutcome::Stored { bars } => println!("  OK: {symbol} ({bars} bars)"),
            DownloadOutcome::AlreadyCached => println!("  OK: {symbol} (cached)"),
            DownloadOutcome::Empty => println!("  EMPTY: {symbol}"),
            DownloadOutcome::Failed(e) => println!("  FAIL: {symbol}: {e}"),
        }
    }
    if !summary.all_succeeded() {
        bail!("{} of {} symbols failed", summary.failed(), symbols.len());
    }
    Ok(())
}

struct AnalyzeArgs {
    symbol: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    config: Option<PathBuf>,
    csv_dir: Option<PathBuf>,
    offline: bool,
    cache_dir: PathBuf,
    json: Option<PathBuf>,
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let (start, end) = date_range(args.start, args.end);
    let request = AnalysisRequest::new(normalize_symbol(&args.symbol), start, end)?;

    let provider: Box<dyn MarketDataProvider> = match args.csv_dir {
        Some(dir) => Box::new(CsvPriceProvider::new(dir)),
        None => Box::new(
            CachedProvider::new(yahoo()?, SeriesCache::new(&args.cache_dir)).offline(args.offline),
        ),
    };

    let pipeline = AnalysisPipeline::from_config(&config)?;
    let report = pipeline.run(provider.as_ref(), &request)?;
    print_analysis(&report);

    if let Some(path) = args.json {
        write_json(&path, &report)?;
    }
    Ok(())
}

fn print_analysis(report: &AnalysisReport) {
    let (Some(first), Some(last)) = (report.dates.first(), report.dates.last()) else {
        return;
    };
    let last_idx = report.dates.len() - 1;
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));

    println!();
    println!("=== {} ({}) ===", report.symbol, report.source);
    println!("Period:         {first} to {last} ({} bars)", report.dates.len());
    println!("Last close:     {}", fmt(report.closes[last_idx]));
    if report.dates.len() <= report.warmup_bars {
        println!(
            "NOTE: {} bars is within the {}-bar indicator warm-up",
            report.dates.len(),
            report.warmup_bars
        );
    }
    println!();
    println!("--- Indicators (last bar) ---");
    for series in report.indicators.iter() {
        println!("{:<14}  {}", series.name, fmt(series.values[last_idx]));
    }
    for diagnostic in report.indicators.diagnostics() {
        println!("NOTE: {diagnostic}");
    }
    println!();
    println!("--- Signal ---");
    let state = report.signals.get(last_idx).unwrap_or_default();
    println!("Current:        {state:?}");
    println!(
        "Periods:        {} long / {} flat / {} short",
        report.backtest.periods_long, report.backtest.periods_flat, report.backtest.periods_short
    );
    println!();
    println!("--- Backtest ---");
    println!("Strategy:       {:.2}%", report.backtest.total_return * 100.0);
    println!("Buy and hold:   {:.2}%", report.backtest.buy_and_hold_return * 100.0);
    println!();
}

#[derive(Serialize)]
struct RegressionOutput<'a> {
    report: &'a RegressionReport,
    row: &'a PredictionRow,
    prediction: f64,
}

fn run_regress(
    data: &Path,
    target: &str,
    config: Option<&Path>,
    overrides: &[String],
    json: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let table = FeatureTable::from_csv_path(data)?;
    let fitted = RegressionEstimator::new(config.regression).fit(&table, target)?;

    let mut row = fitted.model.default_row();
    for assignment in overrides {
        fitted.model.apply_override(&mut row, assignment)?;
    }
    let prediction = fitted.model.predict(&row)?;
    print_regression(&fitted.report, &row, prediction);

    if let Some(path) = json {
        write_json(
            path,
            &RegressionOutput {
                report: &fitted.report,
                row: &row,
                prediction,
            },
        )?;
    }
    Ok(())
}

fn print_regression(report: &RegressionReport, row: &PredictionRow, prediction: f64) {
    println!();
    println!("=== Regression: {} ===", report.target);
    println!("Rows:           {} train / {} test", report.train_rows, report.test_rows);
    println!("R² (test):      {:.4}", report.r2);
    println!("RMSE (test):    {:.4}", report.rmse);
    println!("MAE (test):     {:.4}", report.mae);
    println!("R² (train):     {:.4}", report.train_r2);
    println!();
    println!("{:<24} {:>14}", "Feature", "Coefficient");
    println!("{}", "-".repeat(39));
    println!("{:<24} {:>14.4}", "(intercept)", report.intercept);
    for c in &report.coefficients {
        println!("{:<24} {:>14.4}", c.feature, c.value);
    }
    if !report.dropped_features.is_empty() {
        println!("Dropped (collinear/constant): {}", report.dropped_features.join(", "));
    }
    println!();
    println!("--- Prediction ---");
    for (column, value) in row.iter() {
        match value {
            FeatureValue::Number(v) => println!("{column:<24} {v:.4}"),
            FeatureValue::Category(c) => println!("{column:<24} {c}"),
        }
    }
    println!("Predicted {}: {prediction:.4}", report.target);
    println!();
}

fn run_cache_status(cache_dir: &Path, symbol: Option<&str>) -> Result<()> {
    let cache = SeriesCache::new(cache_dir);
    let entries = match symbol {
        Some(symbol) => cache.status(symbol)?,
        None => cache.entries()?,
    };

    if entries.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    println!("Cache: {}", cache_dir.display());
    println!("Entries: {}", entries.len());
    println!();
    println!("{:<8} {:<25} {:>6} {:>10}  {}", "Symbol", "Range", "Bars", "Size", "Key");
    println!("{}", "-".repeat(72));
    for meta in &entries {
        let size = std::fs::metadata(cache_dir.join(format!("{}.parquet", meta.key)))
            .map(|m| m.len())
            .unwrap_or(0);
        println!(
            "{:<8} {:<25} {:>6} {:>10}  {}",
            meta.symbol,
            format!("{} to {}", meta.start, meta.end),
            meta.bar_count,
            format_size(size),
            short_key(&meta.key)
        );
    }
    Ok(())
}

/// First 12 characters of a cache key; sidecars written by hand may be shorter.
fn short_key(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
