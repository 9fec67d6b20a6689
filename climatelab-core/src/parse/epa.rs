//! EPA climate indicators sea level table (`epa-sea-level.csv`).
//!
//! ```text
//! Year,CSIRO Adjusted Sea Level,Lower Error Bound,Upper Error Bound,NOAA Adjusted Sea Level
//! 1880-03-15,0,-0.952755905,0.952755905,
//! ```
//!
//! One row per year, keyed by a mid-year ISO date. Values are inches relative
//! to the 1880 level. The NOAA column only starts in 1993.

use super::{column_index, csv_error, csv_reader, optional_number, record_line, ParseError, SeriesParser};
use crate::domain::{Granularity, Indicator, Observation, Period, TimeSeries};
use tracing::debug;

const DATASET: &str = "EPA sea level";
pub const DEFAULT_COLUMN: &str = "CSIRO Adjusted Sea Level";

#[derive(Debug, Clone)]
pub struct EpaSeaLevelParser {
    column: String,
}

impl EpaSeaLevelParser {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Default for EpaSeaLevelParser {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMN)
    }
}

impl SeriesParser for EpaSeaLevelParser {
    fn indicator(&self) -> Indicator {
        Indicator::SeaLevel
    }

    fn dataset(&self) -> &'static str {
        DATASET
    }

    fn parse(&self, raw: &str) -> Result<TimeSeries, ParseError> {
        let mut reader = csv_reader(raw);
        let headers = reader.headers().map_err(|e| csv_error(e, DATASET))?.clone();
        let year_col = column_index(&headers, "Year", DATASET)?;
        let level_col = column_index(&headers, &self.column, DATASET)?;

        let mut observations = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(e, DATASET))?;
            let line = record_line(&record);

            let stamp = record.get(year_col).unwrap_or_default();
            let period = Period::parse_as(stamp, Granularity::Annual).map_err(|e| {
                ParseError::InvalidPeriod {
                    dataset: DATASET,
                    line,
                    value: stamp.to_string(),
                    reason: e.to_string(),
                }
            })?;
            let value = optional_number(
                record.get(level_col).unwrap_or_default(),
                DATASET,
                line,
                &self.column,
            )?;
            observations.push(Observation::new(period, value));
        }

        if observations.is_empty() {
            return Err(ParseError::NoRows {
                dataset: DATASET,
                detail: String::new(),
            });
        }

        debug!(column = %self.column, observations = observations.len(), "parsed EPA sea level table");
        Ok(TimeSeries::new(
            Indicator::SeaLevel,
            Granularity::Annual,
            observations,
        ))
    }
}
