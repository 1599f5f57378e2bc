//! Feature engineering
//!
//! Turns an ordered daily price history into a dense indicator table:
//! - one-day return
//! - SMA 5 / 10 / 20 / 50 / 200
//! - 10-day sample volatility of close
//! - 14-period RSI
//!
//! Rows where any active indicator lacks history are dropped, never imputed.

pub mod indicators;
mod feature_set;

#[cfg(test)]
mod tests;

pub use feature_set::FeatureSet;

use crate::error::{Result, SignalError};
use crate::types::PriceBar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single derived column of the indicator table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    #[serde(rename = "return")]
    Return,
    #[serde(rename = "sma_5")]
    Sma5,
    #[serde(rename = "sma_10")]
    Sma10,
    #[serde(rename = "sma_20")]
    Sma20,
    #[serde(rename = "sma_50")]
    Sma50,
    #[serde(rename = "sma_200")]
    Sma200,
    #[serde(rename = "volatility_10")]
    Volatility10,
    #[serde(rename = "rsi_14")]
    Rsi14,
}

impl Indicator {
    pub const ALL: [Indicator; 8] = [
        Indicator::Return,
        Indicator::Sma5,
        Indicator::Sma10,
        Indicator::Sma20,
        Indicator::Sma50,
        Indicator::Sma200,
        Indicator::Volatility10,
        Indicator::Rsi14,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Indicator::Return => "return",
            Indicator::Sma5 => "sma_5",
            Indicator::Sma10 => "sma_10",
            Indicator::Sma20 => "sma_20",
            Indicator::Sma50 => "sma_50",
            Indicator::Sma200 => "sma_200",
            Indicator::Volatility10 => "volatility_10",
            Indicator::Rsi14 => "rsi_14",
        }
    }

    /// Index of the first row at which this indicator is defined
    pub fn warmup(&self) -> usize {
        match self {
            Indicator::Return => 1,
            Indicator::Sma5 => 4,
            Indicator::Sma10 => 9,
            Indicator::Sma20 => 19,
            Indicator::Sma50 => 49,
            Indicator::Sma200 => 199,
            Indicator::Volatility10 => 9,
            Indicator::Rsi14 => 13,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One dated row of the indicator table.
///
/// Indicators outside the builder's active set are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub close: f64,
    pub daily_return: Option<f64>,
    pub sma_5: Option<f64>,
    pub sma_10: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub volatility_10: Option<f64>,
    pub rsi_14: Option<f64>,
}

impl IndicatorRow {
    /// Value of a single indicator column
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::Return => self.daily_return,
            Indicator::Sma5 => self.sma_5,
            Indicator::Sma10 => self.sma_10,
            Indicator::Sma20 => self.sma_20,
            Indicator::Sma50 => self.sma_50,
            Indicator::Sma200 => self.sma_200,
            Indicator::Volatility10 => self.volatility_10,
            Indicator::Rsi14 => self.rsi_14,
        }
    }

    fn set(&mut self, indicator: Indicator, value: Option<f64>) {
        let slot = match indicator {
            Indicator::Return => &mut self.daily_return,
            Indicator::Sma5 => &mut self.sma_5,
            Indicator::Sma10 => &mut self.sma_10,
            Indicator::Sma20 => &mut self.sma_20,
            Indicator::Sma50 => &mut self.sma_50,
            Indicator::Sma200 => &mut self.sma_200,
            Indicator::Volatility10 => &mut self.volatility_10,
            Indicator::Rsi14 => &mut self.rsi_14,
        };
        *slot = value;
    }

    fn empty(bar: &PriceBar) -> Self {
        Self {
            date: bar.date,
            close: bar.close,
            daily_return: None,
            sma_5: None,
            sma_10: None,
            sma_20: None,
            sma_50: None,
            sma_200: None,
            volatility_10: None,
            rsi_14: None,
        }
    }
}

/// Builds indicator tables for a fixed set of active indicators
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    indicators: Vec<Indicator>,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self {
            indicators: Indicator::ALL.to_vec(),
        }
    }
}

impl FeatureBuilder {
    /// Builder computing every indicator
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder computing only the given indicators; the others stay `None`
    pub fn with_indicators(indicators: &[Indicator]) -> Self {
        let mut active: Vec<Indicator> = Vec::new();
        for ind in indicators {
            if !active.contains(ind) {
                active.push(*ind);
            }
        }
        Self { indicators: active }
    }

    /// Builder for exactly the columns a feature set needs
    pub fn for_feature_set(set: &FeatureSet) -> Self {
        Self::with_indicators(&set.columns)
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    /// Number of leading input rows that can never produce an output row
    pub fn warmup(&self) -> usize {
        self.indicators.iter().map(|i| i.warmup()).max().unwrap_or(0)
    }

    /// Compute the indicator table for an ordered price history
    pub fn build(&self, prices: &[PriceBar]) -> Result<Vec<IndicatorRow>> {
        if prices.is_empty() {
            return Err(SignalError::EmptyHistory("empty price series".to_string()));
        }
        validate_history(prices)?;

        let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
        let mut rows: Vec<IndicatorRow> = prices.iter().map(IndicatorRow::empty).collect();

        for &indicator in &self.indicators {
            let column = compute_column(indicator, &closes);
            for (row, value) in rows.iter_mut().zip(column) {
                row.set(indicator, value);
            }
        }

        let active = &self.indicators;
        let dense: Vec<IndicatorRow> = rows
            .into_iter()
            .filter(|row| active.iter().all(|&i| row.get(i).is_some_and(f64::is_finite)))
            .collect();

        if dense.is_empty() {
            return Err(SignalError::InsufficientHistory {
                rows: prices.len(),
                required: self.warmup() + 1,
            });
        }

        tracing::debug!(
            input_rows = prices.len(),
            output_rows = dense.len(),
            "Built indicator table"
        );

        Ok(dense)
    }
}

/// Full indicator table for an ordered price history
pub fn build_features(prices: &[PriceBar]) -> Result<Vec<IndicatorRow>> {
    FeatureBuilder::new().build(prices)
}

fn compute_column(indicator: Indicator, closes: &[f64]) -> Vec<Option<f64>> {
    match indicator {
        Indicator::Return => indicators::pct_change(closes),
        Indicator::Sma5 => indicators::rolling_mean(closes, 5),
        Indicator::Sma10 => indicators::rolling_mean(closes, 10),
        Indicator::Sma20 => indicators::rolling_mean(closes, 20),
        Indicator::Sma50 => indicators::rolling_mean(closes, 50),
        Indicator::Sma200 => indicators::rolling_mean(closes, 200),
        Indicator::Volatility10 => indicators::rolling_std(closes, 10),
        Indicator::Rsi14 => indicators::rsi(closes, 14),
    }
}

/// Dates strictly increasing, closes finite and positive
fn validate_history(prices: &[PriceBar]) -> Result<()> {
    for (i, bar) in prices.iter().enumerate() {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(SignalError::InvalidHistory(format!(
                "non-positive or non-finite close {} on {}",
                bar.close, bar.date
            )));
        }
        if i > 0 && bar.date <= prices[i - 1].date {
            return Err(SignalError::InvalidHistory(format!(
                "dates not strictly increasing at {} (previous {})",
                bar.date,
                prices[i - 1].date
            )));
        }
    }
    Ok(())
}
