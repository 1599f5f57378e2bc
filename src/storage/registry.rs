//! Model registry
//!
//! Owns the loaded-classifier cache. There is no process-wide instance; the
//! registry is built once and handed to whatever needs classifiers.

use super::{ArtifactStore, ModelKey};
use crate::error::{Result, SignalError};
use crate::model::TrainedClassifier;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// What to do when asked for a classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Missing artifact is `ModelNotFound`
    LoadOnly,
    /// Train and persist only when no artifact exists
    TrainIfAbsent,
    /// Always train and overwrite
    Retrain,
}

impl LoadPolicy {
    /// Policy for a train request: `force` retrains, otherwise reuse
    pub fn for_training(force: bool) -> Self {
        if force {
            LoadPolicy::Retrain
        } else {
            LoadPolicy::TrainIfAbsent
        }
    }
}

pub struct ModelRegistry {
    store: Arc<dyn ArtifactStore>,
    cache: RwLock<HashMap<ModelKey, Arc<TrainedClassifier>>>,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Persisted classifiers must carry the key and feature set they are
    /// stored under.
    fn verify(key: ModelKey, classifier: &TrainedClassifier) -> Result<()> {
        if classifier.key != key {
            return Err(SignalError::FeatureMismatch(format!(
                "artifact for {} holds a {} classifier",
                key, classifier.key
            )));
        }
        classifier.feature_set.verify(&key.feature_set())
    }

    /// Cached or stored classifier; never trains
    pub fn get(&self, key: ModelKey) -> Result<Arc<TrainedClassifier>> {
        if let Some(hit) = self.cache.read().get(&key) {
            return Ok(Arc::clone(hit));
        }

        let classifier = self.store.load(key)?;
        Self::verify(key, &classifier)?;
        let classifier = Arc::new(classifier);

        info!(model = %key, location = %self.store.describe(key), "Classifier loaded");
        self.cache.write().insert(key, Arc::clone(&classifier));
        Ok(classifier)
    }

    /// Apply `policy` to `key`.
    ///
    /// `Some` is the classifier to use as-is; `None` means the policy asks for
    /// a fresh one, which the caller trains and hands to [`publish`].
    ///
    /// [`publish`]: ModelRegistry::publish
    pub fn lookup(&self, key: ModelKey, policy: LoadPolicy) -> Result<Option<Arc<TrainedClassifier>>> {
        match policy {
            LoadPolicy::LoadOnly => self.get(key).map(Some),
            LoadPolicy::TrainIfAbsent => match self.get(key) {
                Ok(c) => Ok(Some(c)),
                Err(SignalError::ModelNotFound(_)) => {
                    info!(model = %key, "No stored classifier, training");
                    Ok(None)
                }
                Err(e) => Err(e),
            },
            LoadPolicy::Retrain => Ok(None),
        }
    }

    /// Persist and cache a freshly trained classifier
    pub fn publish(&self, classifier: TrainedClassifier) -> Result<Arc<TrainedClassifier>> {
        let key = classifier.key;
        Self::verify(key, &classifier)?;
        self.store.save(key, &classifier)?;

        let classifier = Arc::new(classifier);
        if self
            .cache
            .write()
            .insert(key, Arc::clone(&classifier))
            .is_some()
        {
            warn!(model = %key, "Replaced cached classifier");
        }
        info!(model = %key, location = %self.store.describe(key), "Classifier published");
        Ok(classifier)
    }

    /// Drop a cached entry so the next `get` reloads from the store
    pub fn invalidate(&self, key: ModelKey) {
        self.cache.write().remove(&key);
    }
}
