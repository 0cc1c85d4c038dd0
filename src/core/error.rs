//! Error types for rate acquisition, storage and conversion.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Rate data that parsed but cannot be trusted.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SnapshotError {
    #[error("no rates present")]
    Empty,

    #[error("rate for {code} is {rate}, which is not a positive number")]
    InvalidRate { code: String, rate: f64 },

    #[error("required currencies missing: {}", .0.join(", "))]
    MissingCurrencies(Vec<String>),

    #[error("base currency {actual} does not match expected {expected}")]
    BaseMismatch { expected: String, actual: String },
}

/// A single rate source could not deliver usable data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { url: String, timeout: Duration },

    #[error("malformed response from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("invalid rates from {url}: {source}")]
    Invalid {
        url: String,
        #[source]
        source: SnapshotError,
    },
}

/// No fresh snapshot could be obtained this session.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("no internet connection")]
    Offline,

    #[error("all {attempted} rate sources failed")]
    SourcesExhausted { attempted: usize },

    #[error("no rate sources configured")]
    NoSources,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored rates at {} are unreadable: {message}", .path.display())]
    CorruptData { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no exchange rate data available")]
    NoDataAvailable { offline: bool },

    #[error("none of the catalog currencies have a rate")]
    NoCurrenciesAvailable,
}

/// Rejected user input. The prompt that produced it is asked again.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversionError {
    #[error("amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    #[error("amount {amount} exceeds the maximum of {max}")]
    AmountTooLarge { amount: f64, max: f64 },

    #[error("currency {0} is not available in the rate data")]
    UnknownCurrency(String),

    #[error("source and target currency are both {0}")]
    SameCurrency(String),

    #[error("converting {amount} {source_code} to {target} does not give a finite result")]
    OutOfRange {
        amount: f64,
        source_code: String,
        target: String,
    },
}
