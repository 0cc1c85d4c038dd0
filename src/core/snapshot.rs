//! Exchange rate snapshots and their validation rules

use crate::core::error::SnapshotError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All rates retrieved at one point in time, relative to `base`.
///
/// Serialized as `{"base": .., "rates": {..}, "date": ..}` which is also the
/// on-disk format of the snapshot store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
    #[serde(rename = "date")]
    pub fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn new(base: &str, rates: BTreeMap<String, f64>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            base: base.to_string(),
            rates,
            fetched_at,
        }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Checks that the snapshot has rates and that every one of them is a
    /// strictly positive, finite multiplier.
    pub fn check_rates(&self) -> Result<(), SnapshotError> {
        if self.rates.is_empty() {
            return Err(SnapshotError::Empty);
        }
        if let Some((code, rate)) = self
            .rates
            .iter()
            .find(|(_, rate)| !(rate.is_finite() && **rate > 0.0))
        {
            return Err(SnapshotError::InvalidRate {
                code: code.clone(),
                rate: *rate,
            });
        }
        Ok(())
    }

    /// Required currencies that are absent from this snapshot, in the order given.
    pub fn missing(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|code| !self.rates.contains_key(code.as_str()))
            .cloned()
            .collect()
    }

    /// Full acceptance check for freshly fetched data.
    pub fn validate(&self, required: &[String]) -> Result<(), SnapshotError> {
        self.check_rates()?;
        let missing = self.missing(required);
        if !missing.is_empty() {
            return Err(SnapshotError::MissingCurrencies(missing));
        }
        Ok(())
    }
}
