//! Fusion rules
//!
//! Two rule tables turn the short-horizon (stock) and long-horizon (fund)
//! classifier outputs into one recommendation. Both are first-match-wins.

use crate::types::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default probability threshold for the stock classifier
pub const STOCK_THRESHOLD: f64 = 0.65;
/// Default probability threshold for the fund classifier
pub const ETF_THRESHOLD: f64 = 0.55;
/// Stock confidence at which the categorical policy enters on its own
pub const STRONG_STOCK_CONFIDENCE: f64 = 0.80;

/// Combined recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FusedSignal {
    // independent threshold policy
    StrongBuy,
    ShortTermBuy,
    LongTermBuy,
    StrongSell,
    ShortTermSell,
    LongTermSell,
    Hold,
    // categorical policy
    EnterTrade,
    RiskyTrade,
    ExitOrHedge,
    Wait,
}

impl FusedSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusedSignal::StrongBuy => "STRONG_BUY",
            FusedSignal::ShortTermBuy => "SHORT_TERM_BUY",
            FusedSignal::LongTermBuy => "LONG_TERM_BUY",
            FusedSignal::StrongSell => "STRONG_SELL",
            FusedSignal::ShortTermSell => "SHORT_TERM_SELL",
            FusedSignal::LongTermSell => "LONG_TERM_SELL",
            FusedSignal::Hold => "HOLD",
            FusedSignal::EnterTrade => "ENTER_TRADE",
            FusedSignal::RiskyTrade => "RISKY_TRADE",
            FusedSignal::ExitOrHedge => "EXIT_OR_HEDGE",
            FusedSignal::Wait => "WAIT",
        }
    }

    /// Human-readable label, as shown to end users
    pub fn label(&self) -> &'static str {
        match self {
            FusedSignal::StrongBuy => "Strong Buy",
            FusedSignal::ShortTermBuy => "Short-Term Buy",
            FusedSignal::LongTermBuy => "Long-Term Buy",
            FusedSignal::StrongSell => "Strong Sell",
            FusedSignal::ShortTermSell => "Short-Term Sell",
            FusedSignal::LongTermSell => "Long-Term Sell",
            FusedSignal::Hold => "Hold",
            FusedSignal::EnterTrade => "Enter Trade",
            FusedSignal::RiskyTrade => "Risky Trade",
            FusedSignal::ExitOrHedge => "Exit or Hedge",
            FusedSignal::Wait => "Wait",
        }
    }
}

impl fmt::Display for FusedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn above(p: Option<f64>, threshold: f64) -> bool {
    p.is_some_and(|p| p > threshold)
}

fn below(p: Option<f64>, threshold: f64) -> bool {
    p.is_some_and(|p| p < threshold)
}

/// Independent threshold fusion.
///
/// A missing probability never satisfies a comparison, so one model alone
/// can still produce its single-horizon buy/sell.
pub fn fuse_policy_a(
    stock_prob: Option<f64>,
    etf_prob: Option<f64>,
    stock_thresh: f64,
    etf_thresh: f64,
) -> FusedSignal {
    let stock_buy = above(stock_prob, stock_thresh);
    let etf_buy = above(etf_prob, etf_thresh);
    let stock_sell = below(stock_prob, 1.0 - stock_thresh);
    let etf_sell = below(etf_prob, 1.0 - etf_thresh);

    if stock_buy && etf_buy {
        FusedSignal::StrongBuy
    } else if stock_buy {
        FusedSignal::ShortTermBuy
    } else if etf_buy {
        FusedSignal::LongTermBuy
    } else if stock_sell && etf_sell {
        FusedSignal::StrongSell
    } else if stock_sell {
        FusedSignal::ShortTermSell
    } else if etf_sell {
        FusedSignal::LongTermSell
    } else {
        FusedSignal::Hold
    }
}

/// Categorical fusion with the default strong-confidence cutoff.
///
/// `etf_conf` is accepted for signature parity but does not affect the result.
pub fn fuse_policy_b(
    stock_pred: Direction,
    etf_pred: Direction,
    stock_conf: f64,
    etf_conf: f64,
) -> FusedSignal {
    fuse_categorical(
        Some(stock_pred),
        Some(etf_pred),
        stock_conf,
        etf_conf,
        STRONG_STOCK_CONFIDENCE,
    )
}

pub(crate) fn fuse_categorical(
    stock_pred: Option<Direction>,
    etf_pred: Option<Direction>,
    stock_conf: f64,
    _etf_conf: f64,
    strong_confidence: f64,
) -> FusedSignal {
    match (stock_pred, etf_pred) {
        (Some(Direction::Up), _) if stock_conf >= strong_confidence => FusedSignal::EnterTrade,
        (Some(Direction::Up), Some(Direction::Up)) => FusedSignal::EnterTrade,
        (Some(Direction::Up), _) => FusedSignal::RiskyTrade,
        (Some(Direction::Down), _) => FusedSignal::ExitOrHedge,
        (None, _) => FusedSignal::Wait,
    }
}
