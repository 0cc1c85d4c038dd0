//! Ordered fallback over rate sources

use crate::core::error::{AcquisitionError, FetchError, SnapshotError};
use crate::core::rates::{ConnectivityProbe, RatePayload, RateSource, expected_base};
use crate::core::snapshot::RateSnapshot;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub struct RateAcquisition<'a> {
    source: &'a (dyn RateSource + Send + Sync),
    probe: &'a (dyn ConnectivityProbe + Send + Sync),
    required: &'a [String],
    fetch_timeout: Duration,
}

impl<'a> RateAcquisition<'a> {
    pub fn new(
        source: &'a (dyn RateSource + Send + Sync),
        probe: &'a (dyn ConnectivityProbe + Send + Sync),
        required: &'a [String],
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            probe,
            required,
            fetch_timeout,
        }
    }

    /// Returns the first snapshot that passes validation, trying `sources` in
    /// order. Each source is tried at most once. The connectivity probe runs
    /// first, so an offline caller gets `Offline` even with no sources.
    #[instrument(name = "AcquireRates", skip(self))]
    pub async fn acquire(&self, sources: &[String]) -> Result<RateSnapshot, AcquisitionError> {
        if !self.probe.is_online().await {
            warn!("Connectivity probe failed, skipping rate sources");
            return Err(AcquisitionError::Offline);
        }

        if sources.is_empty() {
            return Err(AcquisitionError::NoSources);
        }

        for source in sources {
            match self.try_source(source).await {
                Ok(snapshot) => {
                    debug!(source = %source, base = %snapshot.base, "Accepted rates");
                    return Ok(snapshot);
                }
                Err(e) => warn!(error = %e, "Rate source rejected"),
            }
        }

        Err(AcquisitionError::SourcesExhausted {
            attempted: sources.len(),
        })
    }

    async fn try_source(&self, url: &str) -> Result<RateSnapshot, FetchError> {
        debug!("Requesting rates from {}", url);
        let body = tokio::time::timeout(self.fetch_timeout, self.source.fetch(url))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout: self.fetch_timeout,
            })??;

        let snapshot = RatePayload::parse(url, &body)?.into_snapshot(Utc::now());
        let invalid = |source: SnapshotError| FetchError::Invalid {
            url: url.to_string(),
            source,
        };

        if let Some(expected) = expected_base(url) {
            if snapshot.base != expected {
                return Err(invalid(SnapshotError::BaseMismatch {
                    expected: expected.to_string(),
                    actual: snapshot.base.clone(),
                }));
            }
        }
        snapshot.validate(self.required).map_err(invalid)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub(crate) const USD_BODY: &str =
        r#"{"base": "USD", "date": "2025-08-25", "rates": {"USD": 1.0, "EUR": 0.9, "RUB": 85.2}}"#;
    pub(crate) const EUR_BODY: &str =
        r#"{"base": "EUR", "date": "2025-08-25", "rates": {"USD": 1.1, "EUR": 1.0, "RUB": 94.6}}"#;

    /// Serves canned responses per URL and records every URL requested.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        responses: HashMap<String, Result<String, u16>>,
        delays: HashMap<String, Duration>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        pub(crate) fn respond(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub(crate) fn fail(mut self, url: &str, status: u16) -> Self {
            self.responses.insert(url.to_string(), Err(status));
            self
        }

        fn delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RateSource for FakeSource {
        async fn fetch(&self, source: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(source.to_string());
            if let Some(delay) = self.delays.get(source) {
                tokio::time::sleep(*delay).await;
            }
            match self.responses.get(source) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FetchError::Status {
                    url: source.to_string(),
                    status: *status,
                }),
                None => Err(FetchError::Transport {
                    url: source.to_string(),
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    pub(crate) struct FixedProbe(pub(crate) bool);

    #[async_trait]
    impl ConnectivityProbe for FixedProbe {
        async fn is_online(&self) -> bool {
            self.0
        }
    }

    const ONLINE: FixedProbe = FixedProbe(true);
    const OFFLINE: FixedProbe = FixedProbe(false);

    pub(crate) fn required() -> Vec<String> {
        vec!["USD".to_string(), "EUR".to_string(), "RUB".to_string()]
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_valid_source_wins() {
        let source = FakeSource::default()
            .fail("http://s1/latest/USD", 500)
            .respond("http://s2/latest/EUR", EUR_BODY)
            .respond("http://s3/latest/USD", USD_BODY);
        let required = required();
        let acquisition =
            RateAcquisition::new(&source, &ONLINE, &required, Duration::from_secs(5));

        let snapshot = acquisition
            .acquire(&urls(&[
                "http://s1/latest/USD",
                "http://s2/latest/EUR",
                "http://s3/latest/USD",
            ]))
            .await
            .unwrap();

        assert_eq!(snapshot.base, "EUR");
        assert_eq!(snapshot.rate("RUB"), Some(94.6));
        assert_eq!(
            source.calls(),
            vec!["http://s1/latest/USD", "http://s2/latest/EUR"]
        );
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_exhaustion() {
        let source = FakeSource::default()
            .fail("http://s1/latest/USD", 503)
            .respond("http://s2/latest/USD", "<html>maintenance</html>");
        let required = required();
        let acquisition =
            RateAcquisition::new(&source, &ONLINE, &required, Duration::from_secs(5));

        let result = acquisition
            .acquire(&urls(&["http://s1/latest/USD", "http://s2/latest/USD"]))
            .await;

        assert_eq!(
            result,
            Err(AcquisitionError::SourcesExhausted { attempted: 2 })
        );
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_offline_skips_all_sources() {
        let source = FakeSource::default().respond("http://s1/latest/USD", USD_BODY);
        let required = required();
        let acquisition =
            RateAcquisition::new(&source, &OFFLINE, &required, Duration::from_secs(5));

        let result = acquisition.acquire(&urls(&["http://s1/latest/USD"])).await;

        assert_eq!(result, Err(AcquisitionError::Offline));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_source_list() {
        let source = FakeSource::default();
        let required = required();
        let acquisition =
            RateAcquisition::new(&source, &ONLINE, &required, Duration::from_secs(5));

        assert_eq!(
            acquisition.acquire(&[]).await,
            Err(AcquisitionError::NoSources)
        );
    }

    #[tokio::test]
    async fn test_empty_source_list_offline_reports_offline() {
        let source = FakeSource::default();
        let required = required();
        let acquisition =
            RateAcquisition::new(&source, &OFFLINE, &required, Duration::from_secs(5));

        assert_eq!(
            acquisition.acquire(&[]).await,
            Err(AcquisitionError::Offline)
        );
    }

    #[tokio::test]
    async fn test_missing_required_currency_rejected() {
        let partial = r#"{"base": "USD", "rates": {"USD": 1.0, "EUR": 0.9}}"#;
        let source = FakeSource::default()
            .respond("http://s1/latest/USD", partial)
            .respond("http://s2/latest/USD", USD_BODY);
        let required = required();
        let acquisition =
            RateAcquisition::new(&source, &ONLINE, &required, Duration::from_secs(5));

        let snapshot = acquisition
            .acquire(&urls(&["http://s1/latest/USD", "http://s2/latest/USD"]))
            .await
            .unwrap();

        assert_eq!(snapshot.rate("RUB"), Some(85.2));
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_negative_rate_rejected() {
        let bad = r#"{"base": "USD", "rates": {"USD": 1.0, "EUR": -0.9, "RUB": 85.2}}"#;
        let source = FakeSource::default().respond("http://s1/latest/USD", bad);
        let required = required();
        let acquisition =
            RateAcquisition::new(&source, &ONLINE, &required, Duration::from_secs(5));

        let result = acquisition.acquire(&urls(&["http://s1/latest/USD"])).await;
        assert_eq!(
            result,
            Err(AcquisitionError::SourcesExhausted { attempted: 1 })
        );
    }

    #[tokio::test]
    async fn test_base_mismatch_rejected() {
        let source = FakeSource::default()
            .respond("http://s1/latest/USD", EUR_BODY)
            .respond("http://s2/rates", EUR_BODY);
        let required = required();
        let acquisition =
            RateAcquisition::new(&source, &ONLINE, &required, Duration::from_secs(5));

        let snapshot = acquisition
            .acquire(&urls(&["http://s1/latest/USD", "http://s2/rates"]))
            .await
            .unwrap();

        // The second URL makes no promise about its base, so EUR is accepted.
        assert_eq!(snapshot.base, "EUR");
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_moves_to_next_source() {
        let source = FakeSource::default()
            .respond("http://slow/latest/USD", USD_BODY)
            .delay("http://slow/latest/USD", Duration::from_secs(60))
            .respond("http://fast/latest/EUR", EUR_BODY);
        let required = required();
        let acquisition =
            RateAcquisition::new(&source, &ONLINE, &required, Duration::from_secs(10));

        let snapshot = acquisition
            .acquire(&urls(&["http://slow/latest/USD", "http://fast/latest/EUR"]))
            .await
            .unwrap();

        assert_eq!(snapshot.base, "EUR");
        assert_eq!(source.calls().len(), 2);
    }
}
