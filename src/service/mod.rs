//! Signal service
//!
//! Glue between the adapters (price source, artifact registry) and the pure
//! pipeline. The CLI and the HTTP API both drive this type; neither talks to
//! the pipeline directly.

#[cfg(test)]
mod tests;

use crate::client::PriceSource;
use crate::config::Config;
use crate::dataset::label;
use crate::error::{Result, SignalError};
use crate::features::{build_features, FeatureBuilder, FeatureSet, IndicatorRow};
use crate::model::{predict, ModelKey, PredictionResult, TrainedClassifier};
use crate::storage::{LoadPolicy, ModelRegistry};
use crate::strategy::{FusedSignal, FusionPolicy, SignalFuser, SingleSignal};
use crate::training::{
    train_fund_classifier_with, train_stock_classifier_with, TestPrediction, TrainingMetrics,
    TrainingParams,
};
use crate::types::{FundHorizon, PriceBar};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Result of a train request
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub key: ModelKey,
    pub classifier: Arc<TrainedClassifier>,
    /// `None` when an existing artifact was reused
    pub metrics: Option<TrainingMetrics>,
}

/// One classifier applied to the latest row of a ticker's history
#[derive(Debug, Clone, Serialize)]
pub struct ModelPrediction {
    pub ticker: String,
    pub key: ModelKey,
    pub as_of: NaiveDate,
    pub prediction: PredictionResult,
    pub signal: SingleSignal,
}

/// Both classifiers fused under one policy
#[derive(Debug, Clone, Serialize)]
pub struct CombinedSignal {
    pub ticker: String,
    pub as_of: NaiveDate,
    pub horizon: FundHorizon,
    pub policy: FusionPolicy,
    pub stock: Option<PredictionResult>,
    pub etf: Option<PredictionResult>,
    pub signal: FusedSignal,
}

/// Fit the classifier for `key` from raw prices.
///
/// Both keys train on the full indicator table, so a row is only usable once
/// every indicator (SMA 200 included) has history; the classifier then reads
/// its own columns from it.
pub fn fit_from_prices(
    key: ModelKey,
    prices: &[PriceBar],
    params: &TrainingParams,
) -> Result<(TrainedClassifier, TrainingMetrics)> {
    let rows = build_features(prices)?;
    let labeled = label(&rows, key.horizon_days())?;
    match key {
        ModelKey::Stock => {
            let (classifier, _, metrics) = train_stock_classifier_with(&labeled, params)?;
            Ok((classifier, metrics))
        }
        ModelKey::Fund(horizon) => train_fund_classifier_with(&labeled, horizon, params),
    }
}

/// Write held-out predictions as CSV (date, close, target, predicted, confidence)
pub fn export_predictions(path: &Path, predictions: &[TestPrediction]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for p in predictions {
        writer.serialize(p)?;
    }
    writer.flush()?;
    Ok(())
}

pub struct SignalService {
    source: Arc<dyn PriceSource>,
    registry: Arc<ModelRegistry>,
    fuser: SignalFuser,
    config: Config,
}

impl SignalService {
    pub fn new(source: Arc<dyn PriceSource>, registry: Arc<ModelRegistry>, config: Config) -> Self {
        Self {
            source,
            registry,
            fuser: SignalFuser::new(config.fusion.clone()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Fetch history, treating an empty result as `EmptyHistory`
    pub async fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let bars = self.source.fetch(ticker, start, end).await?;
        if bars.is_empty() {
            return Err(SignalError::EmptyHistory(format!(
                "{} between {} and {}",
                ticker, start, end
            )));
        }
        Ok(bars)
    }

    fn training_source(&self, key: ModelKey) -> (&str, NaiveDate) {
        let data = &self.config.data;
        match key {
            ModelKey::Stock => (&data.stock_ticker, data.stock_start),
            ModelKey::Fund(_) => (&data.fund_ticker, data.fund_start),
        }
    }

    async fn fit_and_publish(
        &self,
        key: ModelKey,
        prices: Arc<Vec<PriceBar>>,
    ) -> Result<TrainReport> {
        let params = self.config.training_params();
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || {
            let (classifier, metrics) = fit_from_prices(key, &prices, &params)?;
            let classifier = registry.publish(classifier)?;
            Ok::<_, SignalError>(TrainReport {
                key,
                classifier,
                metrics: Some(metrics),
            })
        })
        .await
        .map_err(|e| SignalError::Model(format!("training task for {} failed: {}", key, e)))?
    }

    /// Report for a classifier the registry handed back under `policy`
    fn reuse(key: ModelKey, classifier: Arc<TrainedClassifier>) -> TrainReport {
        info!(model = %key, "Reusing stored classifier");
        TrainReport {
            key,
            classifier,
            metrics: None,
        }
    }

    /// Train the stock classifier on the configured ticker and window, if
    /// `policy` asks for one.
    pub async fn train_stock(&self, policy: LoadPolicy) -> Result<TrainReport> {
        let key = ModelKey::Stock;
        if let Some(existing) = self.registry.lookup(key, policy)? {
            return Ok(Self::reuse(key, existing));
        }
        let (ticker, start) = self.training_source(key);
        let prices = self.history(ticker, start, self.config.data.train_end).await?;
        info!(ticker, rows = prices.len(), "Training stock classifier");
        self.fit_and_publish(key, Arc::new(prices)).await
    }

    /// Train fund classifiers for `horizons` that `policy` does not satisfy
    /// from the registry, one blocking task per horizon, all sharing one
    /// download.
    pub async fn train_funds(
        &self,
        horizons: &[FundHorizon],
        policy: LoadPolicy,
    ) -> Result<Vec<TrainReport>> {
        let mut reports = Vec::with_capacity(horizons.len());
        let mut pending = Vec::new();
        for &h in horizons {
            let key = ModelKey::Fund(h);
            match self.registry.lookup(key, policy)? {
                Some(existing) => reports.push(Self::reuse(key, existing)),
                None => pending.push(h),
            }
        }
        if pending.is_empty() {
            return Ok(reports);
        }

        let (ticker, start) = self.training_source(ModelKey::Fund(pending[0]));
        let prices = Arc::new(self.history(ticker, start, self.config.data.train_end).await?);
        info!(ticker, rows = prices.len(), horizons = pending.len(), "Training fund classifiers");

        let params = self.config.training_params();
        let mut tasks = JoinSet::new();
        for h in pending {
            let prices = Arc::clone(&prices);
            let registry = Arc::clone(&self.registry);
            let params = params.clone();
            tasks.spawn_blocking(move || {
                let key = ModelKey::Fund(h);
                let (classifier, metrics) = fit_from_prices(key, &prices, &params)?;
                let classifier = registry.publish(classifier)?;
                Ok::<_, SignalError>(TrainReport {
                    key,
                    classifier,
                    metrics: Some(metrics),
                })
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let report =
                joined.map_err(|e| SignalError::Model(format!("training task failed: {}", e)))??;
            reports.push(report);
        }
        reports.sort_by_key(|r| r.key.horizon_days());
        Ok(reports)
    }

    /// Latest complete indicator row for `set`
    fn latest_row(prices: &[PriceBar], set: &FeatureSet) -> Result<IndicatorRow> {
        let rows = FeatureBuilder::for_feature_set(set).build(prices)?;
        rows.last().cloned().ok_or_else(|| SignalError::InsufficientHistory {
            rows: prices.len(),
            required: FeatureBuilder::for_feature_set(set).warmup() + 1,
        })
    }

    fn score(&self, key: ModelKey, prices: &[PriceBar]) -> Result<(NaiveDate, PredictionResult)> {
        let classifier = self.registry.get(key)?;
        let row = Self::latest_row(prices, &classifier.feature_set)?;
        let prediction = predict(&classifier, &row)?;
        Ok((row.date, prediction))
    }

    /// Score the latest stock row for `ticker`
    pub async fn predict_stock(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ModelPrediction> {
        let start = start.unwrap_or(self.config.server.stock_history_start);
        let end = end.unwrap_or_else(Self::today);
        let prices = self.history(ticker, start, end).await?;

        let (as_of, prediction) = self.score(ModelKey::Stock, &prices)?;
        let signal = self.fuser.stock_signal(&prediction);
        info!(
            ticker,
            confidence = %format!("{:.3}", prediction.probability_up),
            %signal,
            "predict_stock"
        );
        Ok(ModelPrediction {
            ticker: ticker.to_string(),
            key: ModelKey::Stock,
            as_of,
            prediction,
            signal,
        })
    }

    /// Score the latest fund row for `ticker` at `horizon`
    pub async fn predict_fund(
        &self,
        ticker: &str,
        horizon: FundHorizon,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ModelPrediction> {
        let start = start.unwrap_or(self.config.server.fund_history_start);
        let end = end.unwrap_or_else(Self::today);
        let prices = self.history(ticker, start, end).await?;

        let key = ModelKey::Fund(horizon);
        let (as_of, prediction) = self.score(key, &prices)?;
        let signal = self.fuser.etf_signal(&prediction);
        info!(
            ticker,
            %horizon,
            confidence = %format!("{:.3}", prediction.probability_up),
            %signal,
            "predict_etf"
        );
        Ok(ModelPrediction {
            ticker: ticker.to_string(),
            key,
            as_of,
            prediction,
            signal,
        })
    }

    /// Fuse both classifiers on one ticker.
    ///
    /// A classifier that has not been trained contributes no prediction; the
    /// call fails only if neither is available.
    pub async fn combined_signal(
        &self,
        ticker: &str,
        horizon: FundHorizon,
        policy: Option<FusionPolicy>,
    ) -> Result<CombinedSignal> {
        let policy = policy.unwrap_or(self.fuser.default_policy());
        let start = self
            .config
            .server
            .stock_history_start
            .min(self.config.server.fund_history_start);
        let prices = self.history(ticker, start, Self::today()).await?;

        let stock = self.optional_score(ModelKey::Stock, &prices)?;
        let etf = self.optional_score(ModelKey::Fund(horizon), &prices)?;
        let as_of = match (&stock, &etf) {
            (Some((d, _)), _) | (None, Some((d, _))) => *d,
            (None, None) => {
                return Err(SignalError::ModelNotFound(format!(
                    "neither {} nor {} is trained",
                    ModelKey::Stock,
                    ModelKey::Fund(horizon)
                )))
            }
        };

        let stock = stock.map(|(_, p)| p);
        let etf = etf.map(|(_, p)| p);
        let signal = self.fuser.fuse(policy, stock.as_ref(), etf.as_ref());
        info!(
            ticker,
            %horizon,
            %policy,
            stock = ?stock.map(|p| p.probability_up),
            etf = ?etf.map(|p| p.probability_up),
            %signal,
            "combined_signal"
        );

        Ok(CombinedSignal {
            ticker: ticker.to_string(),
            as_of,
            horizon,
            policy,
            stock,
            etf,
            signal,
        })
    }

    fn optional_score(
        &self,
        key: ModelKey,
        prices: &[PriceBar],
    ) -> Result<Option<(NaiveDate, PredictionResult)>> {
        match self.score(key, prices) {
            Ok(scored) => Ok(Some(scored)),
            Err(SignalError::ModelNotFound(what)) => {
                warn!(model = %key, %what, "Classifier unavailable, fusing without it");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Full indicator table for `ticker`, most recent `limit` rows
    pub async fn features(&self, ticker: &str, limit: usize) -> Result<Vec<IndicatorRow>> {
        let prices = self
            .history(ticker, self.config.server.fund_history_start, Self::today())
            .await?;
        let rows = FeatureBuilder::new().build(&prices)?;
        let skip = rows.len().saturating_sub(limit);
        Ok(rows.into_iter().skip(skip).collect())
    }
}
