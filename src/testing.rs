//! Deterministic fixtures for tests

use crate::dataset::label;
use crate::features::build_features;
use crate::model::TrainedClassifier;
use crate::training::{train_fund_classifier_with, train_stock_classifier_with, TrainingParams};
use crate::types::{FundHorizon, PriceBar, STOCK_HORIZON_DAYS};
use chrono::{Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).expect("valid date")
}

fn bar(day: usize, close: f64) -> PriceBar {
    PriceBar {
        date: start_date() + Duration::days(day as i64),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000_000.0,
    }
}

/// Flat series at `value`
pub fn constant_prices(n: usize, value: f64) -> Vec<PriceBar> {
    (0..n).map(|i| bar(i, value)).collect()
}

/// Series built from explicit closes
pub fn prices_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes.iter().enumerate().map(|(i, &c)| bar(i, c)).collect()
}

/// Seeded random walk with a mild upward drift
pub fn random_walk(n: usize, seed: u64) -> Vec<PriceBar> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            let shock: f64 = rng.random_range(-0.02..0.02);
            price *= 1.0 + 0.0004 + shock;
            bar(i, price)
        })
        .collect()
}

/// Small parameters so tests train in milliseconds
pub fn quick_params() -> TrainingParams {
    TrainingParams {
        n_estimators: 10,
        ..Default::default()
    }
}

/// Stock classifier fitted on a seeded random walk
pub fn stock_classifier(seed: u64) -> TrainedClassifier {
    let rows = build_features(&random_walk(400, seed)).expect("features");
    let labeled = label(&rows, STOCK_HORIZON_DAYS).expect("labels");
    let (classifier, _, _) =
        train_stock_classifier_with(&labeled, &quick_params()).expect("stock classifier");
    classifier
}

/// Fund classifier for `horizon` fitted on a seeded random walk
pub fn fund_classifier(horizon: FundHorizon, seed: u64) -> TrainedClassifier {
    let rows = build_features(&random_walk(700, seed)).expect("features");
    let labeled = label(&rows, horizon.days()).expect("labels");
    let (classifier, _) =
        train_fund_classifier_with(&labeled, horizon, &quick_params()).expect("fund classifier");
    classifier
}
