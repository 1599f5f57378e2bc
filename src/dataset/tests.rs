//! Tests for labeling and splitting

use super::*;
use crate::features::build_features;
use crate::testing::{prices_from_closes, random_walk};

#[test]
fn test_label_drops_last_h_rows() {
    let rows = build_features(&random_walk(400, 2)).unwrap();
    for h in [1u32, 30, 60, 90, 120, 180] {
        let labeled = label(&rows, h).unwrap();
        assert_eq!(labeled.len(), rows.len() - h as usize);
        assert_eq!(labeled[0].row.date, rows[0].date);
        assert_eq!(
            labeled.last().unwrap().row.date,
            rows[rows.len() - 1 - h as usize].date
        );
        assert!(labeled.iter().all(|r| r.horizon == h));
    }
}

#[test]
fn test_label_direction() {
    let mut closes = vec![100.0; 200];
    closes.extend([101.0, 100.0, 100.0, 105.0]);
    let rows = build_features(&prices_from_closes(&closes)).unwrap();
    // rows are closes[199..]: 100, 101, 100, 100, 105
    let labeled = label(&rows, 1).unwrap();
    let targets: Vec<u8> = labeled.iter().map(|r| r.target).collect();
    assert_eq!(targets, vec![1, 0, 0, 1]);
}

#[test]
fn test_label_equal_close_is_down() {
    let rows = build_features(&prices_from_closes(&[50.0; 210])).unwrap();
    let labeled = label(&rows, 2).unwrap();
    assert!(labeled.iter().all(|r| r.target == 0));
}

#[test]
fn test_label_horizon_longer_than_rows() {
    let rows = build_features(&random_walk(210, 4)).unwrap();
    assert!(label(&rows, 30).unwrap().is_empty());
}

#[test]
fn test_label_zero_horizon_rejected() {
    let rows = build_features(&random_walk(210, 4)).unwrap();
    assert!(matches!(label(&rows, 0), Err(SignalError::UnsupportedHorizon(0))));
}

#[test]
fn test_split_is_last_ceil_20_percent() {
    let split = ChronologicalSplit::default();
    for n in 2..500usize {
        let rows: Vec<usize> = (0..n).collect();
        let expected_test = (n as f64 * 0.2).ceil() as usize;
        let expected_test = if n * 20 % 100 == 0 { n / 5 } else { expected_test };
        let (train, test) = split.split(&rows).unwrap();
        assert_eq!(test.len(), expected_test, "n = {}", n);
        assert_eq!(train.len() + test.len(), n);
        assert_eq!(test[0], train.len());
        assert!(train.iter().all(|&i| i < test[0]));
    }
}

#[test]
fn test_split_small_inputs() {
    let split = ChronologicalSplit::default();
    let one = [1];
    assert!(split.split(&one).is_err());
    let (train, test) = split.split(&[1, 2]).unwrap();
    assert_eq!(train, &[1]);
    assert_eq!(test, &[2]);
}

#[test]
fn test_split_custom_fraction() {
    let split = ChronologicalSplit::new(0.25);
    assert_eq!(split.test_len(10), 3);
    assert_eq!(split.test_len(100), 25);
}

#[test]
fn test_dataset_from_rows() {
    let rows = build_features(&random_walk(260, 8)).unwrap();
    let labeled = label(&rows, 1).unwrap();
    let ds = Dataset::from_rows(&labeled, &FeatureSet::fund()).unwrap();
    assert_eq!(ds.len(), labeled.len());
    assert_eq!(ds.n_features(), 7);
    let (down, up) = ds.class_counts();
    assert_eq!(down + up, ds.len());
}
