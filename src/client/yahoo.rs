//! Yahoo Finance chart API client
//!
//! Fetches daily OHLCV bars from `/v8/finance/chart/{ticker}`.

use super::{normalize_bars, PriceSource};
use crate::error::{Result, SignalError};
use crate::types::PriceBar;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; stock-signals/0.1)";

#[derive(Clone)]
pub struct YahooClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl YahooClient {
    /// Create a new client against `base_url` (the `.../v8/finance/chart` prefix)
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn unix_seconds(date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }
}

/// Convert a chart payload into bars. Bars with a null close are dropped;
/// other null fields fall back to the close (volume to 0).
pub(crate) fn parse_chart(ticker: &str, resp: ChartResponse) -> Result<Vec<PriceBar>> {
    if let Some(err) = resp.chart.error {
        return Err(SignalError::DataSource(format!(
            "{}: {} ({})",
            ticker, err.description, err.code
        )));
    }

    let Some(result) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };
        let Some(stamp) = DateTime::from_timestamp(ts + offset, 0) else {
            continue;
        };
        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        bars.push(PriceBar {
            date: stamp.date_naive(),
            open: field(&quote.open).unwrap_or(close),
            high: field(&quote.high).unwrap_or(close),
            low: field(&quote.low).unwrap_or(close),
            close,
            volume: field(&quote.volume).unwrap_or(0.0),
        });
    }

    Ok(normalize_bars(bars))
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        let url = format!("{}/{}", self.base_url, ticker);
        let period1 = Self::unix_seconds(start).to_string();
        let period2 = Self::unix_seconds(end + Duration::days(1)).to_string();

        let resp: ChartResponse = self
            .http
            .get(&url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "history"),
            ])
            .send()
            .await?
            .json()
            .await?;

        let bars = parse_chart(ticker, resp)?;
        let bars: Vec<PriceBar> = bars
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        debug!(ticker, bars = bars.len(), %start, %end, "Fetched price history");
        Ok(bars)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}
