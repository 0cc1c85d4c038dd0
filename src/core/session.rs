//! Session decisions: which snapshot to use, how to describe it and which
//! currencies can be offered. No terminal I/O happens here.

use crate::core::acquisition::RateAcquisition;
use crate::core::config::{AppConfig, CurrencyName};
use crate::core::conversion::{self, ConversionRequest, ConversionResult};
use crate::core::error::{AcquisitionError, ConversionError, SessionError};
use crate::core::freshness::{self, Freshness};
use crate::core::snapshot::RateSnapshot;
use crate::store::SnapshotStore;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Acquiring,
    Acquired,
    FallbackToCache,
    Ready,
    Converting,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStatus {
    /// Fetched during this session.
    Updated,
    /// Loaded from the store because no source could be used.
    Cached(Freshness),
}

/// The snapshot a session converts with, plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRates {
    pub snapshot: RateSnapshot,
    pub status: DataStatus,
    pub connectivity: Connectivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerLevel {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub level: BannerLevel,
    pub text: String,
}

pub fn format_rates_date(fetched_at: DateTime<Utc>) -> String {
    fetched_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub fn status_banner(active: &ActiveRates) -> StatusBanner {
    let date = format_rates_date(active.snapshot.fetched_at);
    let prefix = match active.connectivity {
        Connectivity::Online => "Data not updated",
        Connectivity::Offline => "No internet connection",
    };
    match active.status {
        DataStatus::Updated => StatusBanner {
            level: BannerLevel::Ok,
            text: format!("Data successfully updated, exchange rates as of {date}."),
        },
        DataStatus::Cached(Freshness::Fresh) => StatusBanner {
            level: BannerLevel::Ok,
            text: format!("{prefix}, using current data as of {date}."),
        },
        DataStatus::Cached(Freshness::Stale) => StatusBanner {
            level: BannerLevel::Warning,
            text: format!(
                "{prefix}, using outdated data (older than {} days) as of {date}.",
                freshness::FRESHNESS_THRESHOLD.num_days()
            ),
        },
    }
}

pub fn no_data_banner(error: &SessionError) -> StatusBanner {
    let text = match error {
        SessionError::NoDataAvailable { offline: true } => {
            "No internet connection and no local data available."
        }
        SessionError::NoDataAvailable { offline: false } => {
            "No data available for display. Check internet connection."
        }
        SessionError::NoCurrenciesAvailable => "No available currencies for conversion.",
    };
    StatusBanner {
        level: BannerLevel::Error,
        text: text.to_string(),
    }
}

/// Catalog entries that have a usable rate in `snapshot`, in catalog order.
/// Position `i` in the returned list is offered to the user as number `i + 1`.
pub fn available_currencies(catalog: &[CurrencyName], snapshot: &RateSnapshot) -> Vec<CurrencyName> {
    catalog
        .iter()
        .filter(|c| snapshot.rate(&c.code).is_some_and(|r| r > 0.0))
        .cloned()
        .collect()
}

/// Resolves a 1-based menu number.
pub fn choose(choices: &[CurrencyName], number: usize) -> Option<&CurrencyName> {
    number.checked_sub(1).and_then(|i| choices.get(i))
}

pub struct Session<'a> {
    config: &'a AppConfig,
    state: SessionState,
    active: ActiveRates,
    currencies: Vec<CurrencyName>,
}

impl<'a> Session<'a> {
    /// Obtains the snapshot for this session. Fresh rates are saved to the
    /// store; when none can be fetched the stored snapshot is used instead.
    pub async fn start(
        config: &'a AppConfig,
        acquisition: &RateAcquisition<'_>,
        store: &dyn SnapshotStore,
        now: DateTime<Utc>,
    ) -> Result<Session<'a>, SessionError> {
        let mut state = SessionState::Init;
        transition(&mut state, SessionState::Acquiring);

        let active = match acquisition.acquire(&config.api_urls).await {
            Ok(snapshot) => {
                transition(&mut state, SessionState::Acquired);
                if let Err(e) = store.save(&snapshot) {
                    warn!(error = %e, "Failed to save fetched rates");
                }
                ActiveRates {
                    snapshot,
                    status: DataStatus::Updated,
                    connectivity: Connectivity::Online,
                }
            }
            Err(acquire_error) => {
                let connectivity = match acquire_error {
                    AcquisitionError::Offline => Connectivity::Offline,
                    _ => Connectivity::Online,
                };
                debug!(error = %acquire_error, "Falling back to stored rates");

                let stored = store.load().unwrap_or_else(|e| {
                    warn!(error = %e, "Ignoring unreadable stored rates");
                    None
                });
                let Some(snapshot) = stored else {
                    transition(&mut state, SessionState::Terminated);
                    return Err(SessionError::NoDataAvailable {
                        offline: connectivity == Connectivity::Offline,
                    });
                };

                transition(&mut state, SessionState::FallbackToCache);
                let freshness = freshness::classify(&snapshot, now);
                ActiveRates {
                    snapshot,
                    status: DataStatus::Cached(freshness),
                    connectivity,
                }
            }
        };

        let currencies = available_currencies(&config.currencies, &active.snapshot);
        if currencies.is_empty() {
            transition(&mut state, SessionState::Terminated);
            return Err(SessionError::NoCurrenciesAvailable);
        }

        transition(&mut state, SessionState::Ready);
        Ok(Session {
            config,
            state,
            active,
            currencies,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active(&self) -> &ActiveRates {
        &self.active
    }

    pub fn currencies(&self) -> &[CurrencyName] {
        &self.currencies
    }

    pub fn max_amount(&self) -> f64 {
        self.config.max_amount
    }

    /// Required currencies the active snapshot lacks. Only a stored snapshot
    /// can be missing any, fetched ones are rejected in that case.
    pub fn missing_required(&self) -> Vec<String> {
        self.active.snapshot.missing(&self.config.required_currencies)
    }

    pub fn convert(
        &mut self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConversionError> {
        transition(&mut self.state, SessionState::Converting);
        let result = conversion::convert(request, &self.active.snapshot, self.config.max_amount);
        transition(&mut self.state, SessionState::Ready);
        result
    }

    pub fn terminate(mut self) -> SessionState {
        transition(&mut self.state, SessionState::Terminated);
        self.state
    }
}

fn transition(state: &mut SessionState, next: SessionState) {
    debug!(from = ?*state, to = ?next, "Session state");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::acquisition::tests::{FakeSource, FixedProbe, USD_BODY};
    use crate::core::snapshot::tests::sample_snapshot;
    use crate::store::MemorySnapshotStore;
    use chrono::Duration;

    fn config() -> AppConfig {
        AppConfig {
            api_urls: vec![
                "http://s1/latest/USD".to_string(),
                "http://s2/latest/USD".to_string(),
            ],
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fresh_rates_are_saved() {
        let config = config();
        let source = FakeSource::default().respond("http://s2/latest/USD", USD_BODY);
        let probe = FixedProbe(true);
        let acquisition = RateAcquisition::new(
            &source,
            &probe,
            &config.required_currencies,
            config.fetch_timeout(),
        );
        let store = MemorySnapshotStore::with_snapshot(sample_snapshot(
            Utc::now() - Duration::days(30),
        ));

        let session = Session::start(&config, &acquisition, &store, Utc::now())
            .await
            .unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.active().status, DataStatus::Updated);
        assert_eq!(
            store.load().unwrap().as_ref(),
            Some(&session.active().snapshot)
        );
        assert_eq!(status_banner(session.active()).level, BannerLevel::Ok);
    }

    #[tokio::test]
    async fn test_stale_cache_still_converts() {
        let config = config();
        let source = FakeSource::default();
        let probe = FixedProbe(true);
        let acquisition = RateAcquisition::new(
            &source,
            &probe,
            &config.required_currencies,
            config.fetch_timeout(),
        );
        let now = Utc::now();
        let stored = sample_snapshot(now - Duration::days(10));
        let store = MemorySnapshotStore::with_snapshot(stored.clone());

        let mut session = Session::start(&config, &acquisition, &store, now)
            .await
            .unwrap();

        assert_eq!(
            session.active().status,
            DataStatus::Cached(Freshness::Stale)
        );
        let banner = status_banner(session.active());
        assert_eq!(banner.level, BannerLevel::Warning);
        assert!(
            banner
                .text
                .starts_with("Data not updated, using outdated data (older than 7 days)")
        );

        let result = session
            .convert(&ConversionRequest::new(100.0, "USD", "RUB"))
            .unwrap();
        assert_eq!(result.rounded(), 8520.00);
        assert_eq!(result.fetched_at, stored.fetched_at);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_offline_with_fresh_cache() {
        let config = config();
        let source = FakeSource::default().respond("http://s1/latest/USD", USD_BODY);
        let probe = FixedProbe(false);
        let acquisition = RateAcquisition::new(
            &source,
            &probe,
            &config.required_currencies,
            config.fetch_timeout(),
        );
        let now = Utc::now();
        let store = MemorySnapshotStore::with_snapshot(sample_snapshot(now - Duration::days(2)));

        let session = Session::start(&config, &acquisition, &store, now)
            .await
            .unwrap();

        assert_eq!(session.active().connectivity, Connectivity::Offline);
        assert_eq!(
            session.active().status,
            DataStatus::Cached(Freshness::Fresh)
        );
        assert!(
            status_banner(session.active())
                .text
                .starts_with("No internet connection, using current data")
        );
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_offline_without_sources_still_reports_offline() {
        let config = AppConfig {
            api_urls: Vec::new(),
            ..AppConfig::default()
        };
        let source = FakeSource::default();
        let probe = FixedProbe(false);
        let acquisition = RateAcquisition::new(
            &source,
            &probe,
            &config.required_currencies,
            config.fetch_timeout(),
        );
        let now = Utc::now();
        let store = MemorySnapshotStore::with_snapshot(sample_snapshot(now - Duration::days(2)));

        let session = Session::start(&config, &acquisition, &store, now)
            .await
            .unwrap();

        assert_eq!(session.active().connectivity, Connectivity::Offline);
        assert!(
            status_banner(session.active())
                .text
                .starts_with("No internet connection")
        );
    }

    #[tokio::test]
    async fn test_no_network_and_no_cache() {
        let config = config();
        let source = FakeSource::default();
        let probe = FixedProbe(false);
        let acquisition = RateAcquisition::new(
            &source,
            &probe,
            &config.required_currencies,
            config.fetch_timeout(),
        );
        let store = MemorySnapshotStore::new();

        let result = Session::start(&config, &acquisition, &store, Utc::now()).await;

        let Err(error) = result else {
            panic!("expected the session to fail without data");
        };
        assert_eq!(error, SessionError::NoDataAvailable { offline: true });
        assert_eq!(
            no_data_banner(&error).text,
            "No internet connection and no local data available."
        );
    }

    #[tokio::test]
    async fn test_corrupt_store_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.json");
        std::fs::write(&path, "{\"base\": 42}").unwrap();
        let store = crate::store::FileSnapshotStore::new(&path);

        let config = config();
        let source = FakeSource::default().fail("http://s1/latest/USD", 500);
        let probe = FixedProbe(true);
        let acquisition = RateAcquisition::new(
            &source,
            &probe,
            &config.required_currencies,
            config.fetch_timeout(),
        );

        let result = Session::start(&config, &acquisition, &store, Utc::now()).await;
        assert!(matches!(
            result,
            Err(SessionError::NoDataAvailable { offline: false })
        ));
    }

    #[test]
    fn test_available_currencies_follow_catalog_order() {
        let mut snapshot = sample_snapshot(Utc::now());
        snapshot.rates.insert("GBP".to_string(), 0.78);
        snapshot.rates.insert("XAU".to_string(), 0.0004);

        let catalog = crate::core::config::default_currencies();
        let choices = available_currencies(&catalog, &snapshot);
        let codes: Vec<&str> = choices.iter().map(|c| c.code.as_str()).collect();

        assert_eq!(codes, vec!["USD", "EUR", "RUB", "GBP"]);
        assert_eq!(choose(&choices, 1).map(|c| c.code.as_str()), Some("USD"));
        assert_eq!(choose(&choices, 4).map(|c| c.name.as_str()), Some("British Pound Sterling"));
        assert!(choose(&choices, 0).is_none());
        assert!(choose(&choices, 5).is_none());
    }

    #[tokio::test]
    async fn test_missing_required_in_cached_snapshot() {
        let config = config();
        let source = FakeSource::default();
        let probe = FixedProbe(false);
        let acquisition = RateAcquisition::new(
            &source,
            &probe,
            &config.required_currencies,
            config.fetch_timeout(),
        );
        let mut stored = sample_snapshot(Utc::now());
        stored.rates.remove("RUB");
        let store = MemorySnapshotStore::with_snapshot(stored);

        let session = Session::start(&config, &acquisition, &store, Utc::now())
            .await
            .unwrap();
        assert_eq!(session.missing_required(), vec!["RUB".to_string()]);
        assert_eq!(session.currencies().len(), 2);
        assert_eq!(session.terminate(), SessionState::Terminated);
    }
}
