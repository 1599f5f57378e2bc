//! Gradient boosted trees for binary classification
//!
//! Binomial deviance loss. The ensemble starts from the training log-odds and
//! each stage fits a shallow regression tree to the residuals `y - p`, then
//! replaces every leaf with the Newton step `sum(r) / sum(p * (1 - p))` over
//! the samples it holds.

use super::tree::{normalize, Criterion, DecisionTree, TreeConfig};
use super::{validate_training_data, ModelError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    config: GradientBoostingConfig,
    init_score: f64,
    trees: Vec<DecisionTree>,
    n_features: usize,
    /// Training deviance after each stage
    train_loss: Vec<f64>,
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn deviance(y: &[f64], raw: &[f64]) -> f64 {
    let total: f64 = y
        .iter()
        .zip(raw)
        .map(|(&yi, &f)| {
            // log(1 + e^f) - y f, computed without overflow
            let softplus = if f > 0.0 {
                f + (-f).exp().ln_1p()
            } else {
                f.exp().ln_1p()
            };
            softplus - yi * f
        })
        .sum();
    2.0 * total / y.len() as f64
}

impl GradientBoosting {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        config: GradientBoostingConfig,
    ) -> Result<Self, ModelError> {
        let n_features = validate_training_data(x, y)?;
        if config.n_estimators == 0 || config.learning_rate <= 0.0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators and learning_rate must be positive".into(),
            ));
        }

        let n = y.len();
        let positive = y.iter().filter(|&&v| v > 0.5).count();
        if positive == 0 || positive == n {
            return Err(ModelError::SingleClass);
        }
        let prior = positive as f64 / n as f64;
        let init_score = (prior / (1.0 - prior)).ln();

        let tree_config = TreeConfig {
            criterion: Criterion::SquaredError,
            max_depth: Some(config.max_depth),
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: None,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let indices: Vec<usize> = (0..n).collect();
        let mut raw = vec![init_score; n];
        let mut trees = Vec::with_capacity(config.n_estimators);
        let mut train_loss = Vec::with_capacity(config.n_estimators);

        for _ in 0..config.n_estimators {
            let prob: Vec<f64> = raw.iter().map(|&f| sigmoid(f)).collect();
            let residual: Vec<f64> = y.iter().zip(&prob).map(|(yi, pi)| yi - pi).collect();

            let mut tree = DecisionTree::fit(x, &residual, &indices, &tree_config, &mut rng);

            // Newton step per leaf
            let mut sums: HashMap<usize, (f64, f64)> = HashMap::new();
            let leaves: Vec<usize> = x.iter().map(|row| tree.apply(row)).collect();
            for (i, &leaf) in leaves.iter().enumerate() {
                let entry = sums.entry(leaf).or_insert((0.0, 0.0));
                entry.0 += residual[i];
                entry.1 += prob[i] * (1.0 - prob[i]);
            }
            for (&leaf, &(num, den)) in &sums {
                let value = if den.abs() < 1e-150 { 0.0 } else { num / den };
                tree.set_leaf_value(leaf, value);
            }

            for (f, &leaf) in raw.iter_mut().zip(&leaves) {
                if let Some(&(num, den)) = sums.get(&leaf) {
                    let value = if den.abs() < 1e-150 { 0.0 } else { num / den };
                    *f += config.learning_rate * value;
                }
            }

            train_loss.push(deviance(y, &raw));
            trees.push(tree);
        }

        debug!(
            stages = trees.len(),
            rows = n,
            init_score,
            final_loss = train_loss.last().copied().unwrap_or(f64::NAN),
            "Gradient boosting fitted"
        );

        Ok(Self {
            config,
            init_score,
            trees,
            n_features,
            train_loss,
        })
    }

    /// Raw additive score (log-odds)
    pub fn decision_function(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        let stages: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        Ok(self.init_score + self.config.learning_rate * stages)
    }

    /// P(class 1) for one sample
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        Ok(sigmoid(self.decision_function(features)?))
    }

    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in total.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        normalize(&total)
    }

    pub fn train_loss(&self) -> &[f64] {
        &self.train_loss
    }

    pub fn init_score(&self) -> f64 {
        self.init_score
    }

    pub fn n_stages(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
