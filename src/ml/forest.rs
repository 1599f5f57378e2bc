//! Random forest classifier
//!
//! Bagged Gini trees grown to full depth, each split drawing
//! `floor(sqrt(n_features))` candidate features. The predicted probability
//! is the mean of per-tree leaf class fractions.

use super::tree::{normalize, Criterion, DecisionTree, TreeConfig};
use super::{validate_training_data, ModelError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: RandomForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: RandomForestConfig) -> Result<Self, ModelError> {
        let n_features = validate_training_data(x, y)?;
        if config.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be positive".into(),
            ));
        }

        let max_features = ((n_features as f64).sqrt().floor() as usize).max(1);
        let tree_config = TreeConfig {
            criterion: Criterion::Gini,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: Some(max_features),
        };

        let n = x.len();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_estimators);
        for _ in 0..config.n_estimators {
            let indices: Vec<usize> = if config.bootstrap {
                (0..n).map(|_| rng.random_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(DecisionTree::fit(x, y, &indices, &tree_config, &mut rng));
        }

        debug!(
            trees = trees.len(),
            rows = n,
            features = n_features,
            max_features,
            "Random forest fitted"
        );

        Ok(Self {
            config,
            trees,
            n_features,
        })
    }

    /// P(class 1) for one sample
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.check_width(features)?;
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    fn check_width(&self, features: &[f64]) -> Result<(), ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        Ok(())
    }

    /// Mean of per-tree normalized impurity decrease
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in total.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        normalize(&total)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }
}
