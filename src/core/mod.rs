//! Core rate handling, independent of the terminal and the network stack

pub mod acquisition;
pub mod config;
pub mod conversion;
pub mod error;
pub mod freshness;
pub mod log;
pub mod rates;
pub mod session;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use acquisition::RateAcquisition;
pub use freshness::{FRESHNESS_THRESHOLD, Freshness};
pub use rates::{ConnectivityProbe, RateSource};
pub use snapshot::RateSnapshot;
