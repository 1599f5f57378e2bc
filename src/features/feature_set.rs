//! Versioned feature-set descriptors
//!
//! Each classifier family reads a fixed, ordered subset of the indicator
//! table. The descriptor is persisted with the trained classifier and checked
//! again when the classifier is loaded or used.

use super::{Indicator, IndicatorRow};
use crate::error::{Result, SignalError};
use crate::types::AssetClass;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub name: String,
    pub version: u32,
    pub columns: Vec<Indicator>,
}

impl FeatureSet {
    /// Next-day stock classifier inputs
    pub fn stock() -> Self {
        Self {
            name: "stock".to_string(),
            version: 1,
            columns: vec![
                Indicator::Return,
                Indicator::Sma5,
                Indicator::Sma10,
                Indicator::Volatility10,
                Indicator::Rsi14,
            ],
        }
    }

    /// Long-horizon fund classifier inputs
    pub fn fund() -> Self {
        Self {
            name: "fund".to_string(),
            version: 1,
            columns: vec![
                Indicator::Return,
                Indicator::Sma10,
                Indicator::Sma20,
                Indicator::Sma50,
                Indicator::Sma200,
                Indicator::Volatility10,
                Indicator::Rsi14,
            ],
        }
    }

    pub fn for_asset(asset: AssetClass) -> Self {
        match asset {
            AssetClass::Stock => Self::stock(),
            AssetClass::Fund => Self::fund(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// `name/vN`
    pub fn id(&self) -> String {
        format!("{}/v{}", self.name, self.version)
    }

    /// Feature vector for one row, in descriptor order
    pub fn extract(&self, row: &IndicatorRow) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(self.columns.len());
        for &column in &self.columns {
            match row.get(column) {
                Some(v) => values.push(v),
                None => {
                    return Err(SignalError::FeatureMismatch(format!(
                        "row {} lacks column '{}' required by feature set {}",
                        row.date,
                        column,
                        self.id()
                    )))
                }
            }
        }
        Ok(values)
    }

    /// Fails unless `self` is exactly the expected descriptor
    pub fn verify(&self, expected: &FeatureSet) -> Result<()> {
        if self == expected {
            return Ok(());
        }
        Err(SignalError::FeatureMismatch(format!(
            "classifier trained on {} {:?}, expected {} {:?}",
            self.id(),
            self.column_names(),
            expected.id(),
            expected.column_names()
        )))
    }
}
