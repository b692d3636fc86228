use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, Map};
use reqwest::Url;
use serde::Deserialize;

use crate::collector::CollectOptions;
use crate::error::ScrapeError;

pub const DEFAULT_BASE_URL: &str = "https://quotes.toscrape.com/";
const ENV_PREFIX: &str = "QUOTES";

/// What to do with a listing item that lacks its text or author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    /// Drop the item, log a warning and keep going.
    Skip,
    /// Abort the run.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

/// Run settings. Defaults, overridden by `QUOTES_*` env vars, overridden by CLI flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub delay_ms: u64,
    pub max_pages: u32,
    /// 0 disables the empty-page bound.
    pub max_empty_pages: u32,
    pub retries: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub on_missing: MissingFieldPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: DEFAULT_BASE_URL.to_string(),
            output: PathBuf::from("quotes.csv"),
            format: OutputFormat::Csv,
            delay_ms: 500,
            max_pages: 1000,
            max_empty_pages: 3,
            retries: 3,
            backoff_ms: 1000,
            timeout_secs: 30,
            user_agent: concat!("quotes_scraper/", env!("CARGO_PKG_VERSION")).to_string(),
            on_missing: MissingFieldPolicy::Skip,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    pub(crate) fn load_from(vars: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()
    }

    /// Check the settings and return the normalized base URL.
    pub fn validate(&self) -> Result<Url, ScrapeError> {
        if self.max_pages == 0 {
            return Err(ScrapeError::Config("max_pages must be at least 1".into()));
        }
        normalize_base_url(&self.base_url)
    }

    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            delay: Duration::from_millis(self.delay_ms),
            max_pages: self.max_pages,
            max_empty_pages: self.max_empty_pages,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Parse an http(s) base URL and make sure its path ends with `/`.
pub fn normalize_base_url(raw: &str) -> Result<Url, ScrapeError> {
    let invalid = |message: String| ScrapeError::InvalidBaseUrl {
        url: raw.to_string(),
        message,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
