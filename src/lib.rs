//! Stock and Fund Signal Engine
//!
//! Trains a short-horizon stock direction classifier and a family of
//! long-horizon fund classifiers from daily closes, then fuses their
//! probabilities into one trading signal.
//!
//! ## Architecture
//!
//! ```text
//! PriceSource (Yahoo / CSV cache) → Features → Dataset (labels, split)
//!                                                  ↓
//!                         Training (RandomForest | SMOTE + GradientBoosting)
//!                                                  ↓
//!                             ModelRegistry (ArtifactStore: file / memory)
//!                                                  ↓
//!                  SignalService → SignalFuser (policy A / B) → CLI / HTTP API
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod ml;
pub mod model;
pub mod service;
pub mod storage;
pub mod strategy;
pub mod training;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod config_tests;
