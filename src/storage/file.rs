//! JSON files on disk, one per key (`stock.json`, `fund_30d.json`, ...)

use super::{ArtifactStore, ModelKey};
use crate::error::{Result, SignalError};
use crate::model::TrainedClassifier;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: ModelKey) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn save(&self, key: ModelKey, classifier: &TrainedClassifier) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        // temp file in the same directory so the rename stays on one filesystem
        let tmp = self
            .dir
            .join(format!(".{}.json.tmp-{}", key, std::process::id()));

        let bytes = serde_json::to_vec(classifier)?;
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(SignalError::Storage(format!(
                "failed to publish {}: {}",
                target.display(),
                e
            )));
        }

        debug!(model = %key, path = %target.display(), bytes = bytes.len(), "Artifact saved");
        Ok(())
    }

    fn load(&self, key: ModelKey) -> Result<TrainedClassifier> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(SignalError::ModelNotFound(format!(
                "{} (expected at {})",
                key,
                path.display()
            )));
        }
        let bytes = fs::read(&path)?;
        let classifier = serde_json::from_slice(&bytes)?;
        Ok(classifier)
    }

    fn exists(&self, key: ModelKey) -> bool {
        self.path_for(key).is_file()
    }

    fn describe(&self, key: ModelKey) -> String {
        self.path_for(key).display().to_string()
    }
}
