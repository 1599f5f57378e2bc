//! Classifier training pipelines
//!
//! Both trainers share one procedure: verify the labeled rows, split them
//! chronologically, fit on the head, and score the held-out tail. They differ
//! only in the ensemble they fit and in whether the training partition is
//! rebalanced first.

mod fund;
mod stock;

pub use fund::{train_fund_classifier, train_fund_classifier_with};
pub use stock::{train_stock_classifier, train_stock_classifier_with};

use crate::dataset::{ChronologicalSplit, Dataset, LabeledRow};
use crate::error::{Result, SignalError};
use crate::ml::ClassificationReport;
use crate::model::{ClassifierModel, ModelKey, PredictionResult, TrainedClassifier};
use crate::types::Direction;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Hyperparameters shared by both trainers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingParams {
    pub n_estimators: usize,
    pub seed: u64,
    pub test_fraction: f64,
    pub smote_neighbors: usize,
    pub learning_rate: f64,
    pub boosted_max_depth: usize,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            test_fraction: 0.2,
            smote_neighbors: 5,
            learning_rate: 0.1,
            boosted_max_depth: 3,
        }
    }
}

/// One scored row of the held-out partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPrediction {
    pub date: NaiveDate,
    pub close: f64,
    pub target: u8,
    pub predicted: Direction,
    pub confidence: f64,
}

/// Held-out evaluation of a freshly trained classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub key: ModelKey,
    /// Rows in the training partition before any resampling
    pub train_rows: usize,
    /// Rows the ensemble was actually fitted on
    pub fitted_rows: usize,
    pub test_rows: usize,
    pub report: ClassificationReport,
    pub feature_importances: Vec<(String, f64)>,
    /// P(up) for the last held-out row
    pub latest_confidence: f64,
    /// Every held-out prediction fell in the same class
    pub single_class_predictions: bool,
    pub test_predictions: Vec<TestPrediction>,
}

impl TrainingMetrics {
    pub fn accuracy(&self) -> f64 {
        self.report.accuracy
    }

    /// Importances sorted descending
    pub fn ranked_importances(&self) -> Vec<(String, f64)> {
        let mut ranked = self.feature_importances.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Rows must all be labeled with the key's horizon
fn check_horizon(key: ModelKey, rows: &[LabeledRow]) -> Result<()> {
    let expected = key.horizon_days();
    match rows.iter().find(|r| r.horizon != expected) {
        Some(r) => Err(SignalError::UnsupportedHorizon(r.horizon)),
        None => Ok(()),
    }
}

/// At least two held-out predictions, all in the same class
fn single_class(predicted: &[f64]) -> bool {
    predicted.len() > 1 && predicted.windows(2).all(|w| w[0] == w[1])
}

/// Split, fit via `fit`, then score the test partition.
///
/// `fit` receives the training partition and returns the fitted ensemble and
/// the number of rows it was fitted on.
fn fit_and_evaluate<F>(
    key: ModelKey,
    rows: &[LabeledRow],
    params: &TrainingParams,
    fit: F,
) -> Result<(TrainedClassifier, TrainingMetrics)>
where
    F: FnOnce(&Dataset) -> Result<(ClassifierModel, usize)>,
{
    check_horizon(key, rows)?;
    let feature_set = key.feature_set();

    let (train, test) = ChronologicalSplit::new(params.test_fraction).split(rows)?;
    let train_ds = Dataset::from_rows(train, &feature_set)?;
    let test_ds = Dataset::from_rows(test, &feature_set)?;

    let (down, up) = train_ds.class_counts();
    if down == 0 || up == 0 {
        return Err(SignalError::DegenerateTarget(format!(
            "{} training partition has a single class ({} down, {} up)",
            key, down, up
        )));
    }

    info!(
        model = %key,
        train_rows = train_ds.len(),
        test_rows = test_ds.len(),
        down,
        up,
        "Training classifier"
    );

    let (model, fitted_rows) = fit(&train_ds)?;

    let classifier = TrainedClassifier {
        key,
        feature_set,
        model,
        trained_at: Utc::now(),
        train_rows: fitted_rows,
        train_start: train.first().map(|r| r.row.date),
        train_end: train.last().map(|r| r.row.date),
    };

    let mut test_predictions = Vec::with_capacity(test.len());
    let mut predicted = Vec::with_capacity(test.len());
    for (row, features) in test.iter().zip(&test_ds.features) {
        let result = PredictionResult::from_probability(classifier.probability_up(features)?);
        predicted.push(result.predicted_label.class());
        test_predictions.push(TestPrediction {
            date: row.row.date,
            close: row.row.close,
            target: row.target,
            predicted: result.predicted_label,
            confidence: result.probability_up,
        });
    }

    let report = ClassificationReport::new(&test_ds.labels, &predicted);
    let latest_confidence = test_predictions
        .last()
        .map(|p| p.confidence)
        .unwrap_or(0.5);
    let single_class_predictions = single_class(&predicted);

    if single_class_predictions {
        warn!(
            model = %key,
            test_rows = predicted.len(),
            "Classifier predicts a single class on the held-out partition"
        );
    }

    info!(
        model = %key,
        accuracy = report.accuracy,
        latest_confidence,
        "Classifier trained"
    );

    let metrics = TrainingMetrics {
        key,
        train_rows: train_ds.len(),
        fitted_rows,
        test_rows: test_ds.len(),
        report,
        feature_importances: classifier.feature_importances(),
        latest_confidence,
        single_class_predictions,
        test_predictions,
    };

    Ok((classifier, metrics))
}
