//! Long-horizon fund classifier (boosted trees on a SMOTE-balanced head)

use super::{fit_and_evaluate, TrainingMetrics, TrainingParams};
use crate::dataset::LabeledRow;
use crate::error::Result;
use crate::ml::{GradientBoosting, GradientBoostingConfig, Smote};
use crate::model::{ClassifierModel, ModelKey, TrainedClassifier};
use crate::types::FundHorizon;
use tracing::debug;

/// Train one horizon with default hyperparameters
pub fn train_fund_classifier(
    rows: &[LabeledRow],
    horizon: FundHorizon,
) -> Result<(TrainedClassifier, TrainingMetrics)> {
    train_fund_classifier_with(rows, horizon, &TrainingParams::default())
}

/// Only the training partition is oversampled; held-out rows are scored as-is.
pub fn train_fund_classifier_with(
    rows: &[LabeledRow],
    horizon: FundHorizon,
    params: &TrainingParams,
) -> Result<(TrainedClassifier, TrainingMetrics)> {
    let smote = Smote::new(params.smote_neighbors, params.seed);
    let config = GradientBoostingConfig {
        n_estimators: params.n_estimators,
        learning_rate: params.learning_rate,
        max_depth: params.boosted_max_depth,
        seed: params.seed,
        ..Default::default()
    };

    fit_and_evaluate(ModelKey::Fund(horizon), rows, params, |train| {
        let (x, y) = smote.fit_resample(&train.features, &train.labels)?;
        debug!(
            horizon = %horizon,
            before = train.len(),
            after = y.len(),
            "Training partition rebalanced"
        );
        let model = GradientBoosting::fit(&x, &y, config)?;
        Ok((ClassifierModel::Boosted(model), y.len()))
    })
}
