//! Classifier persistence
//!
//! Trained classifiers are stored under a typed `ModelKey`. The registry
//! sits on top of a store and decides, per call, whether a missing artifact
//! is an error or a reason to train.

mod file;
mod memory;
mod registry;
#[cfg(test)]
mod tests;

pub use crate::model::ModelKey;
pub use file::FileArtifactStore;
pub use memory::MemoryArtifactStore;
pub use registry::{LoadPolicy, ModelRegistry};

use crate::error::Result;
use crate::model::TrainedClassifier;

/// Keyed classifier storage. Writes to a key replace the previous artifact
/// as a whole; readers never observe a partial write.
pub trait ArtifactStore: Send + Sync {
    fn save(&self, key: ModelKey, classifier: &TrainedClassifier) -> Result<()>;

    /// `ModelNotFound` when nothing is stored under `key`
    fn load(&self, key: ModelKey) -> Result<TrainedClassifier>;

    fn exists(&self, key: ModelKey) -> bool;

    /// Human-readable location, for logs
    fn describe(&self, key: ModelKey) -> String;
}
