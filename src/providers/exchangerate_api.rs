use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::error::FetchError;
use crate::core::rates::{ConnectivityProbe, RateSource};

const USER_AGENT: &str = concat!("fxconv/", env!("CARGO_PKG_VERSION"));

fn transport_error(url: &str, e: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    }
}

/// Fetches rate documents over HTTP, e.g. from exchangerate-api.com's
/// `/v4/latest/<CODE>` endpoints.
pub struct ExchangeRateApiSource {
    client: reqwest::Client,
    timeout: Duration,
}

impl ExchangeRateApiSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| transport_error("<client>", e))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl RateSource for ExchangeRateApiSource {
    #[instrument(name = "RateFetch", skip(self), fields(url = %source))]
    async fn fetch(&self, source: &str) -> Result<String, FetchError> {
        let response = self.client.get(source).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: source.to_string(),
                    timeout: self.timeout,
                }
            } else {
                transport_error(source, e)
            }
        })?;

        debug!(status = %response.status(), "Received rate response");

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: source.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|e| transport_error(source, e))
    }
}

/// Reports the network as reachable when any endpoint answers a `HEAD`
/// request, whatever its status code.
pub struct HttpProbe {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl HttpProbe {
    pub fn new(endpoints: &[String], timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| transport_error("<client>", e))?;
        Ok(Self {
            client,
            endpoints: endpoints.to_vec(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_online(&self) -> bool {
        // Without endpoints there is nothing to judge by, so let the sources decide.
        if self.endpoints.is_empty() {
            return true;
        }
        for endpoint in &self.endpoints {
            match self.client.head(endpoint).send().await {
                Ok(response) => {
                    debug!(endpoint = %endpoint, status = %response.status(), "Probe answered");
                    return true;
                }
                Err(e) => debug!(endpoint = %endpoint, error = %e, "Probe failed"),
            }
        }
        false
    }
}
