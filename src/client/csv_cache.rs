//! CSV mirror of downloaded price history

use super::{normalize_bars, PriceSource};
use crate::error::{Result, SignalError};
use crate::types::PriceBar;
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{Reader, Writer};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load bars from a CSV file written by `save_csv`
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<PriceBar>> {
    let file = File::open(&path)?;
    let mut reader = Reader::from_reader(file);
    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let bar: PriceBar = record?;
        bars.push(bar);
    }
    Ok(normalize_bars(bars))
}

/// Write bars to CSV, creating parent directories
pub fn save_csv<P: AsRef<Path>>(bars: &[PriceBar], path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&path)?;
    let mut writer = Writer::from_writer(file);
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}

fn cache_file(dir: &Path, ticker: &str) -> PathBuf {
    dir.join(format!("{}.csv", ticker.to_uppercase()))
}

/// Forwards to an inner source and writes each result to
/// `<dir>/<TICKER>.csv`
pub struct CachingPriceSource<S> {
    inner: S,
    dir: PathBuf,
}

impl<S: PriceSource> CachingPriceSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }

    pub fn cache_path(&self, ticker: &str) -> PathBuf {
        cache_file(&self.dir, ticker)
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for CachingPriceSource<S> {
    async fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        let bars = self.inner.fetch(ticker, start, end).await?;
        if !bars.is_empty() {
            let path = self.cache_path(ticker);
            save_csv(&bars, &path)?;
            info!(ticker, rows = bars.len(), path = %path.display(), "Price history cached");
        }
        Ok(bars)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Serves `<dir>/<TICKER>.csv` files without touching the network
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        let path = cache_file(&self.dir, ticker);
        if !path.exists() {
            return Err(SignalError::DataSource(format!(
                "no cached history at {}",
                path.display()
            )));
        }
        let bars: Vec<PriceBar> = load_csv(&path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        debug!(ticker, bars = bars.len(), "Loaded cached history");
        Ok(bars)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
