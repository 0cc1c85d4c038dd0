use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const DEFAULT_MAX_AMOUNT: f64 = 1_000_000_000.0;
const DEFAULT_DB_FILE_NAME: &str = "currency_rates.json";

/// A currency code and the name shown to the user when choosing it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CurrencyName {
    pub code: String,
    pub name: String,
}

impl CurrencyName {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

fn default_api_urls() -> Vec<String> {
    vec![
        "https://api.exchangerate-api.com/v4/latest/USD".to_string(),
        "https://api.exchangerate-api.com/v4/latest/EUR".to_string(),
    ]
}

fn default_probe_urls() -> Vec<String> {
    vec![
        "https://api.exchangerate-api.com".to_string(),
        "https://www.google.com".to_string(),
        "https://www.cloudflare.com".to_string(),
    ]
}

fn default_max_amount() -> f64 {
    DEFAULT_MAX_AMOUNT
}

fn default_required_currencies() -> Vec<String> {
    ["USD", "EUR", "RUB"].iter().map(|c| c.to_string()).collect()
}

fn default_probe_timeout_secs() -> u64 {
    2
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

pub fn default_currencies() -> Vec<CurrencyName> {
    [
        ("USD", "US Dollar"),
        ("EUR", "Euro"),
        ("RUB", "Russian Ruble"),
        ("UAH", "Ukrainian Hryvnia"),
        ("GBP", "British Pound Sterling"),
        ("JPY", "Japanese Yen"),
        ("CNY", "Chinese Yuan"),
        ("KZT", "Kazakhstani Tenge"),
        ("BYN", "Belarusian Ruble"),
        ("PLN", "Polish Zloty"),
        ("CAD", "Canadian Dollar"),
        ("AUD", "Australian Dollar"),
        ("CHF", "Swiss Franc"),
        ("CZK", "Czech Koruna"),
        ("SEK", "Swedish Krona"),
        ("NOK", "Norwegian Krone"),
        ("MXN", "Mexican Peso"),
        ("SGD", "Singapore Dollar"),
        ("HKD", "Hong Kong Dollar"),
        ("NZD", "New Zealand Dollar"),
        ("ILS", "Israeli Shekel"),
        ("KRW", "South Korean Won"),
    ]
    .iter()
    .map(|(code, name)| CurrencyName::new(code, name))
    .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Where the last good snapshot is kept. Defaults to the platform data dir.
    pub db_file: Option<String>,
    #[serde(default = "default_api_urls")]
    pub api_urls: Vec<String>,
    #[serde(default = "default_max_amount")]
    pub max_amount: f64,
    #[serde(default = "default_currencies")]
    pub currencies: Vec<CurrencyName>,
    #[serde(default = "default_required_currencies")]
    pub required_currencies: Vec<String>,
    #[serde(default = "default_probe_urls")]
    pub probe_urls: Vec<String>,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_file: None,
            api_urls: default_api_urls(),
            max_amount: default_max_amount(),
            currencies: default_currencies(),
            required_currencies: default_required_currencies(),
            probe_urls: default_probe_urls(),
            probe_timeout_secs: default_probe_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to the built-in
    /// defaults when no file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "fxconv", "fxconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn db_file_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.db_file {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "fxconv", "fxconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join(DEFAULT_DB_FILE_NAME))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api_urls.is_empty() {
            anyhow::bail!("api_urls must list at least one rate source");
        }
        if !(self.max_amount.is_finite() && self.max_amount > 0.0) {
            anyhow::bail!("max_amount must be a positive number, got {}", self.max_amount);
        }
        Ok(())
    }
}
