//! In-process store, for tests and one-shot runs

use super::{ArtifactStore, ModelKey};
use crate::error::{Result, SignalError};
use crate::model::TrainedClassifier;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<ModelKey, TrainedClassifier>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.read().is_empty()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn save(&self, key: ModelKey, classifier: &TrainedClassifier) -> Result<()> {
        self.artifacts.write().insert(key, classifier.clone());
        Ok(())
    }

    fn load(&self, key: ModelKey) -> Result<TrainedClassifier> {
        self.artifacts
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| SignalError::ModelNotFound(key.to_string()))
    }

    fn exists(&self, key: ModelKey) -> bool {
        self.artifacts.read().contains_key(&key)
    }

    fn describe(&self, key: ModelKey) -> String {
        format!("memory:{}", key)
    }
}
