//! HTTP fetcher.
//!
//! Fetches a source's raw text over blocking HTTP with a per-request timeout
//! and a bounded retry loop with exponential backoff. Transient failures
//! (timeouts, connection errors, 429, 5xx) are retried; anything else fails
//! immediately. After the last attempt the final error is surfaced wrapped in
//! [`FetchError::RetriesExhausted`].

use super::provider::{DataSource, FetchError, Fetcher, RawDocument, SourceSpec};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest wait between two attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Connection settings for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub backoff_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
            backoff_ms: 500,
            user_agent: concat!("climatelab/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    settings: HttpSettings,
}

impl HttpFetcher {
    pub fn new(settings: HttpSettings) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    /// Delay before retry number `attempt`, capped at [`MAX_BACKOFF`].
    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.settings.backoff_ms)
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(MAX_BACKOFF)
    }

    /// One request, no retry.
    fn fetch_once(&self, spec: &SourceSpec) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(&spec.url)
            .send()
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: spec.url.clone(),
            });
        }

        resp.text().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    timeout_secs: self.settings.timeout_secs,
                }
            } else {
                FetchError::Body(e.to_string())
            }
        })
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                timeout_secs: self.settings.timeout_secs,
            }
        } else if e.is_connect() || e.is_request() {
            FetchError::NetworkUnreachable(e.to_string())
        } else {
            FetchError::Client(e.to_string())
        }
    }
}

impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, spec: &SourceSpec) -> Result<RawDocument, FetchError> {
        let attempts = self.settings.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.backoff(attempt);
                warn!(indicator = %spec.indicator, attempt, delay_ms = delay.as_millis() as u64, "retrying download");
                std::thread::sleep(delay);
            }

            debug!(indicator = %spec.indicator, url = %spec.url, attempt, "requesting");
            match self.fetch_once(spec) {
                Ok(text) => {
                    info!(indicator = %spec.indicator, bytes = text.len(), "downloaded");
                    return Ok(RawDocument::new(
                        spec.indicator,
                        spec.url.clone(),
                        DataSource::Http,
                        text,
                    ));
                }
                Err(e) if e.is_retryable() => {
                    warn!(indicator = %spec.indicator, error = %e, "download attempt failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts,
            last: Box::new(
                last_error.unwrap_or_else(|| FetchError::NetworkUnreachable("no attempt made".into())),
            ),
        })
    }
}
