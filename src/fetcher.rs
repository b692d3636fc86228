use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::settings::Settings;

/// Anything that can hand back the raw HTML of a 1-based listing page.
pub trait PageSource {
    fn fetch(&mut self, page: u32) -> Result<String, ScrapeError>;
}

/// Page 1 is the listing root; page N lives under `page/N/`.
pub fn page_url(base: &Url, page: u32) -> Result<Url, ScrapeError> {
    if page <= 1 {
        return Ok(base.clone());
    }
    base.join(&format!("page/{}/", page))
        .map_err(|e| ScrapeError::InvalidBaseUrl {
            url: base.to_string(),
            message: e.to_string(),
        })
}

/// Blocking HTTP source with bounded retry and exponential backoff.
pub struct HttpFetcher {
    client: Client,
    base: Url,
    retries: u32,
    backoff: Duration,
}

impl HttpFetcher {
    pub fn new(base: Url, settings: &Settings) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()
            .map_err(ScrapeError::Client)?;

        Ok(HttpFetcher {
            client,
            base,
            retries: settings.retries,
            backoff: settings.backoff(),
        })
    }

    fn get(&self, url: &Url) -> Result<String, ScrapeError> {
        let request_err = |source| ScrapeError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url.clone()).send().map_err(request_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(request_err)
    }
}

impl PageSource for HttpFetcher {
    fn fetch(&mut self, page: u32) -> Result<String, ScrapeError> {
        let url = page_url(&self.base, page)?;
        info!("Fetching page #{} ({})", page, url);

        let mut attempt = 0u32;
        loop {
            match self.get(&url) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    let backoff = self.backoff.saturating_mul(1 << attempt.min(16));
                    warn!(
                        "Page #{} failed (attempt {}/{}): {}, backing off {:.1}s",
                        page,
                        attempt + 1,
                        self.retries,
                        e,
                        backoff.as_secs_f64()
                    );
                    thread::sleep(backoff);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ── Tests ──
