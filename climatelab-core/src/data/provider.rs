//! Fetcher trait, source descriptions and structured fetch errors.
//!
//! The [`Fetcher`] trait abstracts over where raw documents come from (HTTP,
//! a local directory) so stages can be swapped for fixtures in tests. The raw
//! cache sits above this trait; fetchers don't know about it.

use crate::domain::Indicator;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const GISTEMP_URL: &str = "https://data.giss.nasa.gov/gistemp/tabledata_v4/GLB.Ts+dSST.txt";
pub const OWID_CO2_URL: &str =
    "https://raw.githubusercontent.com/owid/co2-data/master/owid-co2-data.csv";
pub const EPA_SEA_LEVEL_URL: &str =
    "https://raw.githubusercontent.com/datasets/sea-level-rise/master/data/epa-sea-level.csv";

/// Where one indicator's raw document lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub indicator: Indicator,
    pub url: String,
    /// File name used by the local fetcher and the raw cache.
    pub file_name: String,
}

impl SourceSpec {
    pub fn new(indicator: Indicator, url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            indicator,
            url: url.into(),
            file_name: file_name.into(),
        }
    }

    /// The published endpoint for an indicator.
    pub fn default_for(indicator: Indicator) -> Self {
        match indicator {
            Indicator::TemperatureAnomaly => {
                Self::new(indicator, GISTEMP_URL, "temperature_data.txt")
            }
            Indicator::Co2Emissions => Self::new(indicator, OWID_CO2_URL, "co2_data.csv"),
            Indicator::SeaLevel => Self::new(indicator, EPA_SEA_LEVEL_URL, "sea_level_data.csv"),
        }
    }
}

/// Where a raw document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Http,
    LocalFile,
    Cache,
}

/// Untyped text of one source, before parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub indicator: Indicator,
    /// URL or path the text was read from.
    pub origin: String,
    pub source: DataSource,
    pub text: String,
    pub fetched_at: NaiveDateTime,
}

impl RawDocument {
    pub fn new(indicator: Indicator, origin: impl Into<String>, source: DataSource, text: String) -> Self {
        Self {
            indicator,
            origin: origin.into(),
            source,
            text,
            fetched_at: chrono::Local::now().naive_local(),
        }
    }

    /// BLAKE3 hex digest of the text.
    pub fn content_hash(&self) -> String {
        blake3::hash(self.text.as_bytes()).to_hex().to_string()
    }
}

/// Structured error types for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no cached copy of {indicator}; run without --offline to download it")]
    NotCached { indicator: Indicator },

    #[error("cache error: {0}")]
    Cache(String),
}

impl FetchError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::NetworkUnreachable(_) | FetchError::Timeout { .. } | FetchError::Body(_) => {
                true
            }
            FetchError::HttpStatus { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

/// A source of raw documents.
pub trait Fetcher: Send + Sync {
    /// Human-readable name of this fetcher.
    fn name(&self) -> &str;

    /// Retrieve the raw document for one source.
    fn fetch(&self, spec: &SourceSpec) -> Result<RawDocument, FetchError>;
}
