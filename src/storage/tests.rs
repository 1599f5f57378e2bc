//! Tests for artifact stores and the registry

use super::*;
use crate::error::SignalError;
use crate::features::{build_features, FeatureSet, Indicator};
use crate::model::predict;
use crate::testing::{fund_classifier, random_walk, stock_classifier};
use crate::types::FundHorizon;
use std::sync::Arc;

#[test]
fn test_file_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileArtifactStore::new(dir.path());
    let classifier = fund_classifier(FundHorizon::D60, 1);
    let key = ModelKey::Fund(FundHorizon::D60);

    assert!(!store.exists(key));
    store.save(key, &classifier).unwrap();
    assert!(store.exists(key));
    assert!(dir.path().join("fund_60d.json").is_file());

    let loaded = store.load(key).unwrap();
    assert_eq!(loaded.key, key);
    assert_eq!(loaded.feature_set, FeatureSet::fund());

    let rows = build_features(&random_walk(260, 9)).unwrap();
    for row in &rows {
        assert_eq!(
            predict(&classifier, row).unwrap(),
            predict(&loaded, row).unwrap()
        );
    }
}

#[test]
fn test_file_store_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileArtifactStore::new(dir.path().join("nested"));
    store.save(ModelKey::Stock, &stock_classifier(2)).unwrap();
    store.save(ModelKey::Stock, &stock_classifier(3)).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path().join("nested"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["stock.json".to_string()]);
}

#[test]
fn test_file_store_missing_is_model_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileArtifactStore::new(dir.path());
    let err = store.load(ModelKey::Fund(FundHorizon::D180)).unwrap_err();
    assert!(matches!(err, SignalError::ModelNotFound(_)));
}

#[test]
fn test_file_store_corrupt_artifact() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("stock.json"), b"{not json").unwrap();
    let store = FileArtifactStore::new(dir.path());
    let err = store.load(ModelKey::Stock).unwrap_err();
    assert!(matches!(err, SignalError::Serialization(_)));
}

#[test]
fn test_memory_store() {
    let store = MemoryArtifactStore::new();
    assert!(store.is_empty());
    assert!(matches!(
        store.load(ModelKey::Stock),
        Err(SignalError::ModelNotFound(_))
    ));
    store.save(ModelKey::Stock, &stock_classifier(4)).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.exists(ModelKey::Stock));
    assert_eq!(store.describe(ModelKey::Stock), "memory:stock");
}

#[test]
fn test_registry_load_only() {
    let registry = ModelRegistry::new(Arc::new(MemoryArtifactStore::new()));
    let err = registry
        .lookup(ModelKey::Stock, LoadPolicy::LoadOnly)
        .unwrap_err();
    assert!(matches!(err, SignalError::ModelNotFound(_)));

    let published = registry.publish(stock_classifier(4)).unwrap();
    let found = registry
        .lookup(ModelKey::Stock, LoadPolicy::LoadOnly)
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&published, &found));
}

#[test]
fn test_registry_train_if_absent() {
    let store = Arc::new(MemoryArtifactStore::new());
    let registry = ModelRegistry::new(store.clone());
    assert!(registry
        .lookup(ModelKey::Stock, LoadPolicy::TrainIfAbsent)
        .unwrap()
        .is_none());

    let published = registry.publish(stock_classifier(5)).unwrap();
    assert!(store.exists(ModelKey::Stock));
    let reused = registry
        .lookup(ModelKey::Stock, LoadPolicy::TrainIfAbsent)
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&published, &reused));
}

#[test]
fn test_registry_retrain_replaces() {
    let registry = ModelRegistry::new(Arc::new(MemoryArtifactStore::new()));
    let first = registry.publish(stock_classifier(6)).unwrap();
    assert!(registry
        .lookup(ModelKey::Stock, LoadPolicy::Retrain)
        .unwrap()
        .is_none());
    let second = registry.publish(stock_classifier(7)).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&registry.get(ModelKey::Stock).unwrap(), &second));
}

#[test]
fn test_load_policy_for_training() {
    assert_eq!(LoadPolicy::for_training(true), LoadPolicy::Retrain);
    assert_eq!(LoadPolicy::for_training(false), LoadPolicy::TrainIfAbsent);
}

#[test]
fn test_registry_reloads_after_invalidate() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(Arc::new(FileArtifactStore::new(dir.path())));
    let published = registry.publish(stock_classifier(8)).unwrap();

    registry.invalidate(ModelKey::Stock);
    let reloaded = registry.get(ModelKey::Stock).unwrap();
    assert!(!Arc::ptr_eq(&published, &reloaded));
    assert_eq!(reloaded.trained_at, published.trained_at);
}

#[test]
fn test_registry_rejects_schema_drift() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileArtifactStore::new(dir.path());
    let mut drifted = stock_classifier(9);
    drifted.feature_set.columns.push(Indicator::Sma20);
    drifted.feature_set.version = 2;
    store.save(ModelKey::Stock, &drifted).unwrap();

    let registry = ModelRegistry::new(Arc::new(store));
    let err = registry.get(ModelKey::Stock).unwrap_err();
    assert!(matches!(err, SignalError::FeatureMismatch(_)));
}

#[test]
fn test_registry_rejects_artifact_under_wrong_key() {
    let store = MemoryArtifactStore::new();
    store
        .save(ModelKey::Fund(FundHorizon::D30), &fund_classifier(FundHorizon::D90, 10))
        .unwrap();
    let registry = ModelRegistry::new(Arc::new(store));
    let err = registry.get(ModelKey::Fund(FundHorizon::D30)).unwrap_err();
    assert!(matches!(err, SignalError::FeatureMismatch(_)));
}
