//! Supervised dataset construction
//!
//! Labels indicator rows with the future price direction over a fixed
//! horizon and partitions them chronologically for training.

#[cfg(test)]
mod tests;

use crate::error::{Result, SignalError};
use crate::features::{FeatureSet, IndicatorRow};
use serde::{Deserialize, Serialize};

/// Indicator row plus its forward-looking binary target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub row: IndicatorRow,
    /// 1 if close `horizon` rows later is strictly higher, else 0
    pub target: u8,
    /// Horizon the target was computed over, in rows
    pub horizon: u32,
}

/// Label rows with `close[t + horizon] > close[t]`.
///
/// Must run on the dense indicator table (after undefined rows are dropped);
/// the last `horizon` rows have no future close and are dropped.
pub fn label(rows: &[IndicatorRow], horizon: u32) -> Result<Vec<LabeledRow>> {
    if horizon == 0 {
        return Err(SignalError::UnsupportedHorizon(0));
    }
    let h = horizon as usize;
    if rows.len() <= h {
        return Ok(Vec::new());
    }

    Ok(rows[..rows.len() - h]
        .iter()
        .zip(&rows[h..])
        .map(|(now, future)| LabeledRow {
            row: now.clone(),
            target: u8::from(future.close > now.close),
            horizon,
        })
        .collect())
}

/// Chronological train/test partition.
///
/// The test partition is the last `ceil(test_fraction * n)` rows; nothing is
/// shuffled so training data always precedes test data in time.
#[derive(Debug, Clone, Copy)]
pub struct ChronologicalSplit {
    test_percent: usize,
}

impl Default for ChronologicalSplit {
    fn default() -> Self {
        Self { test_percent: 20 }
    }
}

impl ChronologicalSplit {
    /// `test_fraction` is rounded to whole percent and clamped to 1..=99
    pub fn new(test_fraction: f64) -> Self {
        let pct = (test_fraction * 100.0).round().clamp(1.0, 99.0) as usize;
        Self { test_percent: pct }
    }

    /// Number of rows that land in the test partition
    pub fn test_len(&self, n: usize) -> usize {
        (n * self.test_percent).div_ceil(100)
    }

    /// Split into (train, test)
    pub fn split<'a, T>(&self, rows: &'a [T]) -> Result<(&'a [T], &'a [T])> {
        let n = rows.len();
        let n_test = self.test_len(n);
        if n < 2 || n_test == 0 || n_test >= n {
            return Err(SignalError::InsufficientHistory {
                rows: n,
                required: 2,
            });
        }
        Ok(rows.split_at(n - n_test))
    }
}

/// Dense design matrix for one feature set
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

impl Dataset {
    pub fn from_rows(rows: &[LabeledRow], feature_set: &FeatureSet) -> Result<Self> {
        let mut features = Vec::with_capacity(rows.len());
        let mut labels = Vec::with_capacity(rows.len());
        for r in rows {
            features.push(feature_set.extract(&r.row)?);
            labels.push(f64::from(r.target));
        }
        Ok(Self {
            feature_names: feature_set.column_names(),
            features,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// (down, up) label counts
    pub fn class_counts(&self) -> (usize, usize) {
        let up = self.labels.iter().filter(|&&l| l > 0.5).count();
        (self.labels.len() - up, up)
    }
}
