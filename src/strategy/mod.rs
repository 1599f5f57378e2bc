//! Signal fusion
//!
//! Turns classifier outputs into recommendations, either per model or by
//! fusing the stock and fund predictions under a named policy.

mod fusion;


pub use fusion::{
    fuse_policy_a, fuse_policy_b, FusedSignal, ETF_THRESHOLD, STOCK_THRESHOLD,
    STRONG_STOCK_CONFIDENCE,
};

use crate::config::FusionConfig;
use crate::model::PredictionResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which rule table combines the two predictions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionPolicy {
    /// Probability thresholds on each model independently
    #[default]
    Independent,
    /// Direction labels with a stock-confidence override
    Categorical,
}

impl fmt::Display for FusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionPolicy::Independent => write!(f, "independent"),
            FusionPolicy::Categorical => write!(f, "categorical"),
        }
    }
}

impl FromStr for FusionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "independent" | "a" => Ok(FusionPolicy::Independent),
            "categorical" | "b" => Ok(FusionPolicy::Categorical),
            other => Err(format!("unknown fusion policy: {}", other)),
        }
    }
}

/// Recommendation from a single classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SingleSignal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SingleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingleSignal::Buy => write!(f, "Buy"),
            SingleSignal::Sell => write!(f, "Sell"),
            SingleSignal::Hold => write!(f, "Hold"),
        }
    }
}

/// `Buy` above `threshold`, `Sell` below `1 - threshold`, else `Hold`
pub fn single_model_signal(probability_up: f64, threshold: f64) -> SingleSignal {
    if probability_up > threshold {
        SingleSignal::Buy
    } else if probability_up < 1.0 - threshold {
        SingleSignal::Sell
    } else {
        SingleSignal::Hold
    }
}

/// Applies the configured thresholds and policy
#[derive(Debug, Clone)]
pub struct SignalFuser {
    config: FusionConfig,
}

impl SignalFuser {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn default_policy(&self) -> FusionPolicy {
        self.config.policy
    }

    pub fn stock_signal(&self, stock: &PredictionResult) -> SingleSignal {
        single_model_signal(stock.probability_up, self.config.stock_threshold)
    }

    pub fn etf_signal(&self, etf: &PredictionResult) -> SingleSignal {
        single_model_signal(etf.probability_up, self.config.etf_threshold)
    }

    /// Fuse whichever predictions are available
    pub fn fuse(
        &self,
        policy: FusionPolicy,
        stock: Option<&PredictionResult>,
        etf: Option<&PredictionResult>,
    ) -> FusedSignal {
        match policy {
            FusionPolicy::Independent => fuse_policy_a(
                stock.map(|p| p.probability_up),
                etf.map(|p| p.probability_up),
                self.config.stock_threshold,
                self.config.etf_threshold,
            ),
            FusionPolicy::Categorical => fusion::fuse_categorical(
                stock.map(|p| p.predicted_label),
                etf.map(|p| p.predicted_label),
                stock.map_or(0.0, |p| p.probability_up),
                etf.map_or(0.0, |p| p.probability_up),
                self.config.strong_confidence,
            ),
        }
    }
}
