//! Tree ensemble learners
//!
//! Provides the estimators the classifiers are built from:
//! - CART decision trees (Gini and squared-error criteria)
//! - Random forest with bootstrap sampling and sqrt feature subsampling
//! - Gradient boosted trees with binomial deviance
//! - SMOTE minority oversampling
//! - Binary classification metrics
//!
//! All randomness comes from seeded `ChaCha8Rng` streams, so identical inputs
//! and seeds give identical models.

pub mod boosting;
pub mod forest;
pub mod metrics;
pub mod smote;
pub mod tree;


pub use boosting::{GradientBoosting, GradientBoostingConfig};
pub use forest::{RandomForest, RandomForestConfig};
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use smote::Smote;
pub use tree::{Criterion, DecisionTree, TreeConfig};

use crate::error::SignalError;
use thiserror::Error;

/// Errors raised by the estimators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Training labels contain a single class")]
    SingleClass,

    #[error("Insufficient samples: need {needed}, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    #[error("Dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

impl From<ModelError> for SignalError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::SingleClass | ModelError::InsufficientSamples { .. } => {
                SignalError::DegenerateTarget(err.to_string())
            }
            ModelError::DimensionMismatch { .. } => SignalError::FeatureMismatch(err.to_string()),
            other => SignalError::Model(other.to_string()),
        }
    }
}

/// Check shape and finiteness; returns the feature count
pub(crate) fn validate_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<usize, ModelError> {
    if x.is_empty() {
        return Err(ModelError::InvalidData("empty training set".into()));
    }
    if x.len() != y.len() {
        return Err(ModelError::InvalidData(format!(
            "{} rows but {} labels",
            x.len(),
            y.len()
        )));
    }
    let width = x[0].len();
    if width == 0 {
        return Err(ModelError::InvalidData("rows have no features".into()));
    }
    for (i, row) in x.iter().enumerate() {
        if row.len() != width {
            return Err(ModelError::DimensionMismatch {
                expected: width,
                got: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidData(format!("non-finite value in row {}", i)));
        }
    }
    if y.iter().any(|&v| v != 0.0 && v != 1.0) {
        return Err(ModelError::InvalidData("labels must be 0 or 1".into()));
    }
    Ok(width)
}
