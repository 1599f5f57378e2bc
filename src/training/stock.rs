//! Next-day stock classifier (bagged trees)

use super::{fit_and_evaluate, TrainingMetrics, TrainingParams};
use crate::dataset::LabeledRow;
use crate::error::Result;
use crate::ml::{RandomForest, RandomForestConfig};
use crate::model::{ClassifierModel, ModelKey, TrainedClassifier};

/// Train with default hyperparameters.
///
/// Returns the classifier, the P(up) of the last held-out row, and the
/// held-out metrics.
pub fn train_stock_classifier(
    rows: &[LabeledRow],
) -> Result<(TrainedClassifier, f64, TrainingMetrics)> {
    train_stock_classifier_with(rows, &TrainingParams::default())
}

pub fn train_stock_classifier_with(
    rows: &[LabeledRow],
    params: &TrainingParams,
) -> Result<(TrainedClassifier, f64, TrainingMetrics)> {
    let config = RandomForestConfig {
        n_estimators: params.n_estimators,
        seed: params.seed,
        ..Default::default()
    };

    let (classifier, metrics) = fit_and_evaluate(ModelKey::Stock, rows, params, |train| {
        let forest = RandomForest::fit(&train.features, &train.labels, config)?;
        Ok((ClassifierModel::Forest(forest), train.len()))
    })?;

    Ok((classifier, metrics.latest_confidence, metrics))
}
