//! Snapshot age classification

use crate::core::snapshot::RateSnapshot;
use chrono::{DateTime, Duration, Utc};
use std::fmt::Display;

/// Snapshots at least this old are stale. An age of exactly seven days is
/// already stale.
pub const FRESHNESS_THRESHOLD: Duration = Duration::days(7);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

impl Display for Freshness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Freshness::Fresh => write!(f, "fresh"),
            Freshness::Stale => write!(f, "stale"),
        }
    }
}

pub fn age(snapshot: &RateSnapshot, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(snapshot.fetched_at)
}

/// Whole days elapsed since the snapshot was fetched.
pub fn age_in_days(snapshot: &RateSnapshot, now: DateTime<Utc>) -> i64 {
    age(snapshot, now).num_days()
}

pub fn classify(snapshot: &RateSnapshot, now: DateTime<Utc>) -> Freshness {
    if age(snapshot, now) < FRESHNESS_THRESHOLD {
        Freshness::Fresh
    } else {
        Freshness::Stale
    }
}
