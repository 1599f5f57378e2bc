//! Configuration management
//!
//! Settings come from an optional TOML file layered with `SIGNALS__*`
//! environment variables (`SIGNALS__SERVER__PORT=9000`). Every field has a
//! default, so an empty file or no file at all is a valid configuration.

use crate::error::Result;
use crate::strategy::{FusionPolicy, ETF_THRESHOLD, STOCK_THRESHOLD, STRONG_STOCK_CONFIDENCE};
use crate::training::TrainingParams;
use crate::types::FundHorizon;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SIGNALS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_chart_url")]
    pub chart_url: String,
    #[serde(default = "default_stock_ticker")]
    pub stock_ticker: String,
    #[serde(default = "default_stock_start")]
    pub stock_start: NaiveDate,
    #[serde(default = "default_fund_ticker")]
    pub fund_ticker: String,
    #[serde(default = "default_fund_start")]
    pub fund_start: NaiveDate,
    /// Last date of the training window
    #[serde(default = "default_train_end")]
    pub train_end: NaiveDate,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Write every downloaded history to `<cache_dir>/<TICKER>.csv`
    #[serde(default = "default_true")]
    pub cache_prices: bool,
    /// Serve history from `cache_dir` only, never touching the network
    #[serde(default)]
    pub offline: bool,
}

fn default_chart_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}
fn default_stock_ticker() -> String {
    "AAPL".to_string()
}
fn default_stock_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default()
}
fn default_fund_ticker() -> String {
    "VOO".to_string()
}
fn default_fund_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default()
}
fn default_train_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default()
}
fn default_cache_dir() -> String {
    "data".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            chart_url: default_chart_url(),
            stock_ticker: default_stock_ticker(),
            stock_start: default_stock_start(),
            fund_ticker: default_fund_ticker(),
            fund_start: default_fund_start(),
            train_end: default_train_end(),
            cache_dir: default_cache_dir(),
            cache_prices: true,
            offline: false,
        }
    }
}

impl DataConfig {
    pub fn cache_path(&self) -> PathBuf {
        expand_path(&self.cache_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
    #[serde(default = "default_horizons")]
    pub horizons: Vec<FundHorizon>,
    #[serde(default = "default_horizon")]
    pub default_horizon: FundHorizon,
    /// Held-out stock predictions are exported here after training
    #[serde(default = "default_predictions_csv")]
    pub predictions_csv: String,
}

fn default_artifact_dir() -> String {
    "models".to_string()
}
fn default_horizons() -> Vec<FundHorizon> {
    FundHorizon::ALL.to_vec()
}
fn default_horizon() -> FundHorizon {
    FundHorizon::D30
}
fn default_predictions_csv() -> String {
    "outputs/predictions.csv".to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            horizons: default_horizons(),
            default_horizon: default_horizon(),
            predictions_csv: default_predictions_csv(),
        }
    }
}

impl ModelsConfig {
    pub fn artifact_path(&self) -> PathBuf {
        expand_path(&self.artifact_dir)
    }

    pub fn predictions_path(&self) -> PathBuf {
        expand_path(&self.predictions_csv)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_smote_neighbors")]
    pub smote_neighbors: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_boosted_max_depth")]
    pub boosted_max_depth: usize,
}

fn default_n_estimators() -> usize {
    100
}
fn default_seed() -> u64 {
    42
}
fn default_test_fraction() -> f64 {
    0.2
}
fn default_smote_neighbors() -> usize {
    5
}
fn default_learning_rate() -> f64 {
    0.1
}
fn default_boosted_max_depth() -> usize {
    3
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            smote_neighbors: default_smote_neighbors(),
            learning_rate: default_learning_rate(),
            boosted_max_depth: default_boosted_max_depth(),
        }
    }
}

impl From<&TrainingConfig> for TrainingParams {
    fn from(c: &TrainingConfig) -> Self {
        TrainingParams {
            n_estimators: c.n_estimators,
            seed: c.seed,
            test_fraction: c.test_fraction,
            smote_neighbors: c.smote_neighbors,
            learning_rate: c.learning_rate,
            boosted_max_depth: c.boosted_max_depth,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub policy: FusionPolicy,
    #[serde(default = "default_stock_threshold")]
    pub stock_threshold: f64,
    #[serde(default = "default_etf_threshold")]
    pub etf_threshold: f64,
    /// Stock confidence that enters a trade regardless of the fund model
    #[serde(default = "default_strong_confidence")]
    pub strong_confidence: f64,
}

fn default_stock_threshold() -> f64 {
    STOCK_THRESHOLD
}
fn default_etf_threshold() -> f64 {
    ETF_THRESHOLD
}
fn default_strong_confidence() -> f64 {
    STRONG_STOCK_CONFIDENCE
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            policy: FusionPolicy::default(),
            stock_threshold: STOCK_THRESHOLD,
            etf_threshold: ETF_THRESHOLD,
            strong_confidence: STRONG_STOCK_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// History start when a stock request gives no `train_start`
    #[serde(default = "default_stock_history_start")]
    pub stock_history_start: NaiveDate,
    /// History start when a fund request gives no `train_start`
    #[serde(default = "default_fund_start")]
    pub fund_history_start: NaiveDate,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_stock_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            stock_history_start: default_stock_history_start(),
            fund_history_start: default_fund_start(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Config {
    /// Load from `path` (optional) plus the environment
    pub fn load(path: &str) -> Result<Self> {
        let expanded = expand_path(path);
        let settings = config::Config::builder()
            .add_source(config::File::from(expanded.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("models.horizons")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn training_params(&self) -> TrainingParams {
        TrainingParams::from(&self.training)
    }
}

/// `~` and `$VAR` expansion; the input is used verbatim if expansion fails
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(p) => PathBuf::from(p.as_ref()),
        Err(_) => Path::new(path).to_path_buf(),
    }
}
