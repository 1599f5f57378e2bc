//! Tests for the feature builder

use super::*;
use crate::testing::{constant_prices, prices_from_closes, random_walk};

#[test]
fn test_output_length_full_set() {
    let prices = random_walk(300, 7);
    let rows = build_features(&prices).unwrap();
    assert_eq!(rows.len(), 300 - 199);
    assert_eq!(rows[0].date, prices[199].date);
    assert_eq!(rows.last().unwrap().date, prices[299].date);
}

#[test]
fn test_every_field_defined() {
    let rows = build_features(&random_walk(260, 11)).unwrap();
    for row in &rows {
        for ind in Indicator::ALL {
            assert!(row.get(ind).is_some(), "{} missing on {}", ind, row.date);
        }
    }
}

#[test]
fn test_constant_series_golden_values() {
    let rows = build_features(&constant_prices(250, 100.0)).unwrap();
    assert_eq!(rows.len(), 51);
    for row in &rows {
        assert_eq!(row.sma_5, Some(100.0));
        assert_eq!(row.sma_10, Some(100.0));
        assert_eq!(row.sma_20, Some(100.0));
        assert_eq!(row.sma_50, Some(100.0));
        assert_eq!(row.sma_200, Some(100.0));
        assert_eq!(row.volatility_10, Some(0.0));
        assert_eq!(row.daily_return, Some(0.0));
        // avg_gain = avg_loss = 0 -> rs = 0 / 1e-10 = 0 -> rsi = 100 - 100 / 1 = 0
        assert_eq!(row.rsi_14, Some(0.0));
    }
}

#[test]
fn test_rsi_bounded() {
    for seed in 0..5 {
        let rows = build_features(&random_walk(400, seed)).unwrap();
        for row in rows {
            let rsi = row.rsi_14.unwrap();
            assert!((0.0..=100.0).contains(&rsi), "rsi {} out of range", rsi);
        }
    }
}

#[test]
fn test_sma_matches_window_mean() {
    let prices = random_walk(230, 3);
    let rows = build_features(&prices).unwrap();
    let row = &rows[10];
    let t = 199 + 10;
    let expected: f64 = prices[t - 4..=t].iter().map(|p| p.close).sum::<f64>() / 5.0;
    assert!((row.sma_5.unwrap() - expected).abs() < 1e-9);
    let expected_200: f64 = prices[t - 199..=t].iter().map(|p| p.close).sum::<f64>() / 200.0;
    assert!((row.sma_200.unwrap() - expected_200).abs() < 1e-9);
}

#[test]
fn test_reduced_set_starts_at_row_13() {
    let prices = random_walk(40, 5);
    let rows = FeatureBuilder::for_feature_set(&FeatureSet::stock())
        .build(&prices)
        .unwrap();
    assert_eq!(rows.len(), 40 - 13);
    assert_eq!(rows[0].date, prices[13].date);
    assert!(rows[0].sma_200.is_none());
    assert!(rows[0].rsi_14.is_some());
}

#[test]
fn test_empty_history() {
    let err = build_features(&[]).unwrap_err();
    assert!(matches!(err, SignalError::EmptyHistory(_)));
}

#[test]
fn test_insufficient_history() {
    let err = build_features(&random_walk(199, 1)).unwrap_err();
    match err {
        SignalError::InsufficientHistory { rows, required } => {
            assert_eq!(rows, 199);
            assert_eq!(required, 200);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_exactly_200_rows_yields_one() {
    let rows = build_features(&random_walk(200, 1)).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_unordered_dates_rejected() {
    let mut prices = prices_from_closes(&[100.0; 220]);
    prices.swap(10, 11);
    let err = build_features(&prices).unwrap_err();
    assert!(matches!(err, SignalError::InvalidHistory(_)));
}

#[test]
fn test_feature_set_extract_mismatch() {
    let prices = random_walk(40, 9);
    let rows = FeatureBuilder::for_feature_set(&FeatureSet::stock())
        .build(&prices)
        .unwrap();
    assert_eq!(FeatureSet::stock().extract(&rows[0]).unwrap().len(), 5);
    let err = FeatureSet::fund().extract(&rows[0]).unwrap_err();
    assert!(matches!(err, SignalError::FeatureMismatch(_)));
}

#[test]
fn test_feature_set_verify() {
    assert!(FeatureSet::fund().verify(&FeatureSet::fund()).is_ok());
    assert!(FeatureSet::stock().verify(&FeatureSet::fund()).is_err());

    let mut drifted = FeatureSet::fund();
    drifted.columns.pop();
    assert!(matches!(
        drifted.verify(&FeatureSet::fund()),
        Err(SignalError::FeatureMismatch(_))
    ));
}

#[test]
fn test_indicator_serde_names() {
    let json = serde_json::to_string(&FeatureSet::stock()).unwrap();
    assert!(json.contains("\"sma_5\""));
    assert!(json.contains("\"volatility_10\""));
    let back: FeatureSet = serde_json::from_str(&json).unwrap();
    assert_eq!(back, FeatureSet::stock());
}
