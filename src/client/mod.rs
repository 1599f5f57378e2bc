//! Price history sources
//!
//! - `YahooClient`: daily bars from the public chart endpoint
//! - `CachingPriceSource`: wraps any source and mirrors each fetch to CSV
//! - `CsvPriceSource`: serves previously cached CSV files offline

mod csv_cache;
mod yahoo;

pub use csv_cache::{load_csv, save_csv, CachingPriceSource, CsvPriceSource};
pub use yahoo::YahooClient;

use crate::config::DataConfig;
use crate::error::Result;
use crate::types::PriceBar;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Anything that can supply daily bars for a ticker.
///
/// Implementations return bars in ascending date order with no duplicate
/// dates; gaps (holidays, missing sessions) are allowed. Both ends of the
/// range are inclusive.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<PriceBar>>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Sort ascending, keep the last bar per date, drop bars with unusable closes
pub fn normalize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.retain(|b| b.close.is_finite() && b.close > 0.0);
    bars.sort_by_key(|b| b.date);
    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

/// Source selected by `[data]`: the CSV cache when offline, otherwise Yahoo,
/// mirrored to the cache when `cache_prices` is set.
pub fn price_source(config: &DataConfig) -> Result<Arc<dyn PriceSource>> {
    if config.offline {
        return Ok(Arc::new(CsvPriceSource::new(config.cache_path())));
    }
    let yahoo = YahooClient::new(&config.chart_url)?;
    if config.cache_prices {
        Ok(Arc::new(CachingPriceSource::new(yahoo, config.cache_path())))
    } else {
        Ok(Arc::new(yahoo))
    }
}
