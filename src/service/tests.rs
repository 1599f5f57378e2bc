//! Service tests against a mocked price source

use super::*;
use crate::client::MockPriceSource;
use crate::storage::{LoadPolicy, MemoryArtifactStore};
use crate::strategy::single_model_signal;
use crate::testing::random_walk;

fn test_config() -> Config {
    let mut config = Config::default();
    config.training.n_estimators = 10;
    config
}

fn source_with(n: usize, seed: u64, times: usize) -> MockPriceSource {
    let mut mock = MockPriceSource::new();
    mock.expect_fetch()
        .times(times)
        .returning(move |_, _, _| Ok(random_walk(n, seed)));
    mock.expect_name().return_const("mock");
    mock
}

fn service(source: MockPriceSource) -> SignalService {
    let registry = Arc::new(ModelRegistry::new(Arc::new(MemoryArtifactStore::new())));
    SignalService::new(Arc::new(source), registry, test_config())
}

#[tokio::test]
async fn test_train_then_predict_stock() {
    let svc = service(source_with(400, 1, 2));
    let report = svc.train_stock(LoadPolicy::TrainIfAbsent).await.unwrap();
    assert_eq!(report.key, ModelKey::Stock);
    let metrics = report.metrics.unwrap();
    assert_eq!(metrics.test_predictions.len(), metrics.test_rows);

    let pred = svc.predict_stock("AAPL", None, None).await.unwrap();
    assert_eq!(pred.key, ModelKey::Stock);
    assert_eq!(
        pred.signal,
        single_model_signal(pred.prediction.probability_up, 0.65)
    );
    assert_eq!(pred.as_of, random_walk(400, 1).last().unwrap().date);
}

#[tokio::test]
async fn test_predict_without_model_is_not_found() {
    let svc = service(source_with(300, 2, 1));
    let err = svc.predict_stock("AAPL", None, None).await.unwrap_err();
    assert!(matches!(err, SignalError::ModelNotFound(_)));
}

#[tokio::test]
async fn test_empty_history() {
    let mut mock = MockPriceSource::new();
    mock.expect_fetch().returning(|_, _, _| Ok(Vec::new()));
    let svc = service(mock);
    let err = svc
        .predict_fund("VOO", FundHorizon::D30, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SignalError::EmptyHistory(_)));
}

#[tokio::test]
async fn test_short_history_is_insufficient() {
    let svc = service(source_with(700, 3, 1));
    svc.train_funds(&[FundHorizon::D30], LoadPolicy::TrainIfAbsent).await.unwrap();

    let mut short = MockPriceSource::new();
    short
        .expect_fetch()
        .returning(|_, _, _| Ok(random_walk(150, 3)));
    let svc = SignalService::new(Arc::new(short), Arc::clone(svc.registry()), test_config());
    let err = svc
        .predict_fund("VOO", FundHorizon::D30, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SignalError::InsufficientHistory { .. }));
}

#[tokio::test]
async fn test_train_funds_shares_download_and_reuses() {
    // one fetch for the first call, none for the second
    let svc = service(source_with(700, 4, 1));
    let horizons = [FundHorizon::D60, FundHorizon::D30];
    let reports = svc.train_funds(&horizons, LoadPolicy::TrainIfAbsent).await.unwrap();
    let keys: Vec<ModelKey> = reports.iter().map(|r| r.key).collect();
    assert_eq!(
        keys,
        vec![ModelKey::Fund(FundHorizon::D30), ModelKey::Fund(FundHorizon::D60)]
    );
    assert!(reports.iter().all(|r| r.metrics.is_some()));

    let again = svc.train_funds(&horizons, LoadPolicy::TrainIfAbsent).await.unwrap();
    assert!(again.iter().all(|r| r.metrics.is_none()));
}

#[tokio::test]
async fn test_combined_signal_with_one_model() {
    let svc = service(source_with(500, 5, 2));
    svc.train_stock(LoadPolicy::TrainIfAbsent).await.unwrap();

    let combined = svc
        .combined_signal("AAPL", FundHorizon::D90, Some(FusionPolicy::Independent))
        .await
        .unwrap();
    assert!(combined.etf.is_none());
    let stock = combined.stock.unwrap();
    let expected = crate::strategy::fuse_policy_a(Some(stock.probability_up), None, 0.65, 0.55);
    assert_eq!(combined.signal, expected);
    assert_eq!(combined.policy, FusionPolicy::Independent);
}

#[tokio::test]
async fn test_combined_signal_needs_some_model() {
    let svc = service(source_with(400, 6, 1));
    let err = svc
        .combined_signal("AAPL", FundHorizon::D30, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SignalError::ModelNotFound(_)));
}

#[tokio::test]
async fn test_features_limit() {
    let svc = service(source_with(260, 7, 1));
    let rows = svc.features("VOO", 5).await.unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows.last().unwrap().date, random_walk(260, 7).last().unwrap().date);
}

#[test]
fn test_export_predictions_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outputs").join("predictions.csv");
    let prices = random_walk(300, 8);
    let (_, metrics) = fit_from_prices(ModelKey::Stock, &prices, &test_config().training_params()).unwrap();
    export_predictions(&path, &metrics.test_predictions).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), "date,close,target,predicted,confidence");
    assert_eq!(lines.count(), metrics.test_predictions.len());
}

#[test]
fn test_stock_trains_on_full_indicator_table() {
    let prices = random_walk(300, 9);
    let params = test_config().training_params();
    let (classifier, metrics) = fit_from_prices(ModelKey::Stock, &prices, &params).unwrap();

    // first usable row needs SMA 200 history, even though the stock model
    // only reads five columns
    let full = crate::features::build_features(&prices).unwrap();
    assert_eq!(metrics.train_rows + metrics.test_rows, full.len() - 1);
    assert_eq!(classifier.train_start, Some(full[0].date));
    assert_eq!(classifier.feature_set, crate::features::FeatureSet::stock());
}

#[tokio::test]
async fn test_train_stock_follows_load_policy() {
    // TrainIfAbsent downloads once, the reuse call does not, Retrain does again
    let svc = service(source_with(400, 10, 2));
    let first = svc.train_stock(LoadPolicy::TrainIfAbsent).await.unwrap();
    assert!(first.metrics.is_some());

    let reused = svc.train_stock(LoadPolicy::TrainIfAbsent).await.unwrap();
    assert!(reused.metrics.is_none());
    assert!(Arc::ptr_eq(&first.classifier, &reused.classifier));

    let retrained = svc.train_stock(LoadPolicy::Retrain).await.unwrap();
    assert!(retrained.metrics.is_some());
    assert!(!Arc::ptr_eq(&first.classifier, &retrained.classifier));
}

#[tokio::test]
async fn test_train_load_only_never_trains() {
    let svc = service(source_with(400, 11, 0));
    let err = svc.train_stock(LoadPolicy::LoadOnly).await.unwrap_err();
    assert!(matches!(err, SignalError::ModelNotFound(_)));
    let err = svc
        .train_funds(&[FundHorizon::D30], LoadPolicy::LoadOnly)
        .await
        .unwrap_err();
    assert!(matches!(err, SignalError::ModelNotFound(_)));
}
