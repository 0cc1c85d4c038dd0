//! Remote rate retrieval abstractions

use crate::core::error::FetchError;
use crate::core::snapshot::RateSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Fetches the raw response body for a source descriptor (a URL).
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<String, FetchError>;
}

/// Lightweight check for whether the network is reachable at all.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// The subset of a rate API response that is needed to build a snapshot.
/// Any other fields in the response are ignored.
#[derive(Debug, Deserialize)]
pub struct RatePayload {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
}

impl RatePayload {
    pub fn parse(url: &str, body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    pub fn into_snapshot(self, fetched_at: DateTime<Utc>) -> RateSnapshot {
        RateSnapshot {
            base: self.base,
            rates: self.rates,
            fetched_at,
        }
    }
}

/// The base currency a source promises by its URL, e.g. `.../latest/USD`.
pub fn expected_base(source: &str) -> Option<&str> {
    let last = source.trim_end_matches('/').rsplit('/').next()?;
    let is_code = last.len() == 3 && last.chars().all(|c| c.is_ascii_uppercase());
    is_code.then_some(last)
}
