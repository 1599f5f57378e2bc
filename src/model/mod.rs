//! Trained direction classifiers
//!
//! A `TrainedClassifier` bundles the fitted ensemble with the feature-set
//! descriptor it was trained on. It is immutable once fitted; inference goes
//! through `predict`, which re-extracts the descriptor's columns so a row
//! built for a different feature set is rejected instead of silently
//! misaligned.


use crate::error::{Result, SignalError};
use crate::features::{FeatureSet, IndicatorRow};
use crate::ml::{GradientBoosting, ModelError, RandomForest};
use crate::types::{AssetClass, Direction, FundHorizon, STOCK_HORIZON_DAYS};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one trained classifier (and its persisted artifact)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "asset", content = "horizon")]
pub enum ModelKey {
    Stock,
    Fund(FundHorizon),
}

impl ModelKey {
    pub fn asset_class(&self) -> AssetClass {
        match self {
            ModelKey::Stock => AssetClass::Stock,
            ModelKey::Fund(_) => AssetClass::Fund,
        }
    }

    /// Labeling horizon in trading days
    pub fn horizon_days(&self) -> u32 {
        match self {
            ModelKey::Stock => STOCK_HORIZON_DAYS,
            ModelKey::Fund(h) => h.days(),
        }
    }

    /// Feature set a classifier under this key must be trained on
    pub fn feature_set(&self) -> FeatureSet {
        FeatureSet::for_asset(self.asset_class())
    }

    /// Every key the system trains
    pub fn all() -> Vec<ModelKey> {
        std::iter::once(ModelKey::Stock)
            .chain(FundHorizon::ALL.iter().map(|&h| ModelKey::Fund(h)))
            .collect()
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKey::Stock => write!(f, "stock"),
            ModelKey::Fund(h) => write!(f, "fund_{}", h),
        }
    }
}

/// Fitted ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    Forest(RandomForest),
    Boosted(GradientBoosting),
}

impl ClassifierModel {
    pub fn predict_proba(&self, features: &[f64]) -> std::result::Result<f64, ModelError> {
        match self {
            ClassifierModel::Forest(m) => m.predict_proba(features),
            ClassifierModel::Boosted(m) => m.predict_proba(features),
        }
    }

    pub fn feature_importances(&self) -> Vec<f64> {
        match self {
            ClassifierModel::Forest(m) => m.feature_importances(),
            ClassifierModel::Boosted(m) => m.feature_importances(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClassifierModel::Forest(_) => "random_forest",
            ClassifierModel::Boosted(_) => "gradient_boosting",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedClassifier {
    pub key: ModelKey,
    pub feature_set: FeatureSet,
    pub model: ClassifierModel,
    pub trained_at: DateTime<Utc>,
    /// Rows the ensemble was fitted on (after oversampling, if any)
    pub train_rows: usize,
    /// Date range of the labeled rows used for fitting
    pub train_start: Option<NaiveDate>,
    pub train_end: Option<NaiveDate>,
}

impl TrainedClassifier {
    pub fn horizon_days(&self) -> u32 {
        self.key.horizon_days()
    }

    /// P(up) for an already-extracted feature vector
    pub fn probability_up(&self, features: &[f64]) -> Result<f64> {
        Ok(self.model.predict_proba(features)?)
    }

    /// (column name, relative importance), in feature-set order
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        self.feature_set
            .column_names()
            .into_iter()
            .zip(self.model.feature_importances())
            .collect()
    }
}

/// Output of one inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability_up: f64,
    pub predicted_label: Direction,
}

impl PredictionResult {
    /// Up iff `p > 0.5`
    pub fn from_probability(probability_up: f64) -> Self {
        Self {
            probability_up,
            predicted_label: if probability_up > 0.5 {
                Direction::Up
            } else {
                Direction::Down
            },
        }
    }
}

/// Score one indicator row
pub fn predict(classifier: &TrainedClassifier, row: &IndicatorRow) -> Result<PredictionResult> {
    let features = classifier.feature_set.extract(row)?;
    let p = classifier.probability_up(&features)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(SignalError::Model(format!(
            "{} produced probability {} outside [0, 1]",
            classifier.key, p
        )));
    }
    Ok(PredictionResult::from_probability(p))
}
