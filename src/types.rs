//! Core domain types shared across the pipeline

use crate::error::{Result, SignalError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One trading day of OHLCV data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Predicted or realized price direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Binary class index used by the classifiers (Down = 0, Up = 1)
    pub fn class(&self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => 0.0,
        }
    }

    pub fn from_class(class: f64) -> Self {
        if class > 0.5 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// Which classifier family an instrument is scored with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// Next-day direction, bagged trees
    Stock,
    /// N-day forward direction, boosted trees
    Fund,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Stock => write!(f, "stock"),
            AssetClass::Fund => write!(f, "fund"),
        }
    }
}

/// Horizons the fund classifier is trained for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FundHorizon {
    D30,
    D60,
    D90,
    D120,
    D180,
}

impl FundHorizon {
    pub const ALL: [FundHorizon; 5] = [
        FundHorizon::D30,
        FundHorizon::D60,
        FundHorizon::D90,
        FundHorizon::D120,
        FundHorizon::D180,
    ];

    /// Horizon length in trading days
    pub fn days(&self) -> u32 {
        match self {
            FundHorizon::D30 => 30,
            FundHorizon::D60 => 60,
            FundHorizon::D90 => 90,
            FundHorizon::D120 => 120,
            FundHorizon::D180 => 180,
        }
    }

    /// Parse a horizon, rejecting anything outside the supported set
    pub fn from_days(days: u32) -> Result<Self> {
        match days {
            30 => Ok(FundHorizon::D30),
            60 => Ok(FundHorizon::D60),
            90 => Ok(FundHorizon::D90),
            120 => Ok(FundHorizon::D120),
            180 => Ok(FundHorizon::D180),
            other => Err(SignalError::UnsupportedHorizon(other)),
        }
    }
}

impl TryFrom<u32> for FundHorizon {
    type Error = SignalError;

    fn try_from(days: u32) -> Result<Self> {
        Self::from_days(days)
    }
}

impl From<FundHorizon> for u32 {
    fn from(h: FundHorizon) -> u32 {
        h.days()
    }
}

impl fmt::Display for FundHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

/// Horizon of the stock classifier, in trading days
pub const STOCK_HORIZON_DAYS: u32 = 1;
