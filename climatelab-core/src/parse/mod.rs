//! Source-specific parsers: raw text in, normalized [`TimeSeries`] out.
//!
//! One parser per dataset. Missing-value markers in the source become absent
//! observations; parsers never substitute zero. Malformed rows are errors, not
//! skips, so a silently truncated download cannot masquerade as data.

pub mod epa;
pub mod gistemp;
pub mod owid;

pub use epa::EpaSeaLevelParser;
pub use gistemp::{GistempParser, TemperatureResolution};
pub use owid::OwidCo2Parser;

use crate::domain::{Indicator, TimeSeries};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{dataset}: no header row found")]
    MissingHeader { dataset: &'static str },

    #[error("{dataset}: required column '{column}' not found")]
    MissingColumn {
        dataset: &'static str,
        column: String,
    },

    #[error("{dataset} line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        dataset: &'static str,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{dataset} line {line}: '{value}' in column '{column}' is not a number")]
    InvalidNumber {
        dataset: &'static str,
        line: usize,
        column: String,
        value: String,
    },

    #[error("{dataset} line {line}: invalid period '{value}': {reason}")]
    InvalidPeriod {
        dataset: &'static str,
        line: usize,
        value: String,
        reason: String,
    },

    #[error("{dataset}: malformed CSV: {message}")]
    Csv {
        dataset: &'static str,
        message: String,
    },

    #[error("{dataset}: no data rows{detail}")]
    NoRows {
        dataset: &'static str,
        detail: String,
    },
}

/// Converts one dataset's raw text into a series.
pub trait SeriesParser: Send + Sync {
    fn indicator(&self) -> Indicator;

    /// Short dataset name used in error messages.
    fn dataset(&self) -> &'static str;

    fn parse(&self, raw: &str) -> Result<TimeSeries, ParseError>;
}

/// Per-dataset parser options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    pub temperature_resolution: TemperatureResolution,
    /// OWID `country` value to keep.
    pub co2_region: String,
    /// EPA column holding the sea level measurement.
    pub sea_level_column: String,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            temperature_resolution: TemperatureResolution::Monthly,
            co2_region: owid::DEFAULT_REGION.to_string(),
            sea_level_column: epa::DEFAULT_COLUMN.to_string(),
        }
    }
}

/// The parser responsible for an indicator's dataset.
pub fn parser_for(indicator: Indicator, settings: &ParserSettings) -> Box<dyn SeriesParser> {
    match indicator {
        Indicator::TemperatureAnomaly => {
            Box::new(GistempParser::new(settings.temperature_resolution))
        }
        Indicator::Co2Emissions => Box::new(OwidCo2Parser::new(settings.co2_region.clone())),
        Indicator::SeaLevel => {
            Box::new(EpaSeaLevelParser::new(settings.sea_level_column.clone()))
        }
    }
}

// ── Shared CSV helpers ────────────────────────────────────────────────

/// Tokens treated as "no value" in CSV sources.
const MISSING_MARKERS: [&str; 4] = ["", "NA", "NaN", "nan"];

pub(crate) fn csv_reader(raw: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes())
}

pub(crate) fn column_index(
    headers: &csv::StringRecord,
    name: &str,
    dataset: &'static str,
) -> Result<usize, ParseError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ParseError::MissingColumn {
            dataset,
            column: name.to_string(),
        })
}

pub(crate) fn csv_error(err: csv::Error, dataset: &'static str) -> ParseError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        return ParseError::ColumnCount {
            dataset,
            line: pos.as_ref().map(|p| p.line() as usize).unwrap_or(0),
            expected: *expected_len as usize,
            found: *len as usize,
        };
    }
    ParseError::Csv {
        dataset,
        message: err.to_string(),
    }
}

pub(crate) fn record_line(record: &csv::StringRecord) -> usize {
    record.position().map(|p| p.line() as usize).unwrap_or(0)
}

/// Parse a numeric cell, mapping missing markers to `None`.
pub(crate) fn optional_number(
    text: &str,
    dataset: &'static str,
    line: usize,
    column: &str,
) -> Result<Option<f64>, ParseError> {
    let text = text.trim();
    if MISSING_MARKERS.contains(&text) {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(ParseError::InvalidNumber {
            dataset,
            line,
            column: column.to_string(),
            value: text.to_string(),
        }),
    }
}
