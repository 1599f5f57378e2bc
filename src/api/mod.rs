//! HTTP API
//!
//! Thin JSON layer over [`SignalService`]. Handlers parse query parameters,
//! call the service and shape the response; every status code decision lives
//! in [`ApiError`].

mod error;


pub use error::ApiError;

use crate::service::SignalService;
use crate::strategy::{FusedSignal, FusionPolicy, SingleSignal};
use crate::types::FundHorizon;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

const DEFAULT_API_HORIZON: u32 = 30;

fn default_horizon() -> u32 {
    DEFAULT_API_HORIZON
}

/// Confidence as reported over the wire
fn round3(p: f64) -> f64 {
    (p * 1000.0).round() / 1000.0
}

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub ticker: String,
    pub train_start: Option<NaiveDate>,
    pub train_end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct EtfQuery {
    pub ticker: String,
    #[serde(default = "default_horizon")]
    pub horizon: u32,
    pub train_start: Option<NaiveDate>,
    pub train_end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SignalQuery {
    pub ticker: String,
    #[serde(default = "default_horizon")]
    pub horizon: u32,
    pub policy: Option<FusionPolicy>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StockResponse {
    pub stock_confidence: f64,
    pub signal: SingleSignal,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EtfResponse {
    pub etf_confidence: f64,
    pub signal: SingleSignal,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SignalResponse {
    pub stock_confidence: Option<f64>,
    pub etf_confidence: Option<f64>,
    pub signal: FusedSignal,
    pub policy: FusionPolicy,
}

/// Health check
async fn health_check() -> &'static str {
    "OK"
}

/// Stock classifier on the latest row of `ticker`
pub async fn predict_stock(
    State(service): State<Arc<SignalService>>,
    Query(q): Query<StockQuery>,
) -> ApiResult<StockResponse> {
    let pred = service
        .predict_stock(&q.ticker, q.train_start, q.train_end)
        .await?;
    Ok(Json(StockResponse {
        stock_confidence: round3(pred.prediction.probability_up),
        signal: pred.signal,
    }))
}

/// Fund classifier for one horizon on the latest row of `ticker`
pub async fn predict_etf(
    State(service): State<Arc<SignalService>>,
    Query(q): Query<EtfQuery>,
) -> ApiResult<EtfResponse> {
    let horizon = FundHorizon::from_days(q.horizon)?;
    let pred = service
        .predict_fund(&q.ticker, horizon, q.train_start, q.train_end)
        .await?;
    Ok(Json(EtfResponse {
        etf_confidence: round3(pred.prediction.probability_up),
        signal: pred.signal,
    }))
}

/// Both classifiers fused under `policy` (or the configured default)
pub async fn combined_signal(
    State(service): State<Arc<SignalService>>,
    Query(q): Query<SignalQuery>,
) -> ApiResult<SignalResponse> {
    let horizon = FundHorizon::from_days(q.horizon)?;
    let combined = service.combined_signal(&q.ticker, horizon, q.policy).await?;
    Ok(Json(SignalResponse {
        stock_confidence: combined.stock.map(|p| round3(p.probability_up)),
        etf_confidence: combined.etf.map(|p| round3(p.probability_up)),
        signal: combined.signal,
        policy: combined.policy,
    }))
}

/// Create the API router
pub fn create_router(service: Arc<SignalService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/predict_stock", get(predict_stock))
        .route("/predict_etf", get(predict_etf))
        .route("/signal", get(combined_signal))
        .with_state(service)
}

/// Bind `addr` and serve until the process exits
pub async fn serve(addr: &str, service: Arc<SignalService>) -> crate::error::Result<()> {
    let app = create_router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
