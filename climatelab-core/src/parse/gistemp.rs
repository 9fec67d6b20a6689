//! NASA GISTEMP v4 global land-ocean table (`GLB.Ts+dSST.txt`).
//!
//! Fixed-width text. A free-text preamble is followed by blocks of data rows,
//! each block introduced by a header row beginning with `Year`:
//!
//! ```text
//! Year   Jan  Feb  Mar  Apr  May  Jun  Jul  Aug  Sep  Oct  Nov  Dec    J-D D-N    DJF  MAM  JJA  SON  Year
//! 1880   -19  -25   -9  -17  -10  -21  -18  -11  -14  -23  -22  -18   -17 ***   ****  -12  -17  -20  1880
//! ```
//!
//! Values are hundredths of a degree Celsius; runs of `*` mark missing values.

use super::{ParseError, SeriesParser};
use crate::domain::{Granularity, Indicator, Observation, Period, TimeSeries};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DATASET: &str = "GISTEMP";
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
/// Position of the January-December mean among the value columns.
const ANNUAL_MEAN_COLUMN: usize = 12;

/// Which columns of the table become the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureResolution {
    /// The twelve monthly columns; the aligner averages them per year.
    #[default]
    Monthly,
    /// The published `J-D` annual mean column.
    Annual,
}

#[derive(Debug, Clone, Default)]
pub struct GistempParser {
    resolution: TemperatureResolution,
}

impl GistempParser {
    pub fn new(resolution: TemperatureResolution) -> Self {
        Self { resolution }
    }

    fn required_values(&self) -> usize {
        match self.resolution {
            TemperatureResolution::Monthly => MONTHS.len(),
            TemperatureResolution::Annual => ANNUAL_MEAN_COLUMN + 1,
        }
    }
}

/// Hundredths of a degree → degrees; `*`-only tokens are missing.
fn anomaly(token: &str, line: usize, column: &str) -> Result<Option<f64>, ParseError> {
    if token.chars().all(|c| c == '*') {
        return Ok(None);
    }
    token
        .parse::<i32>()
        .map(|hundredths| Some(f64::from(hundredths) / 100.0))
        .map_err(|_| ParseError::InvalidNumber {
            dataset: DATASET,
            line,
            column: column.to_string(),
            value: token.to_string(),
        })
}

impl SeriesParser for GistempParser {
    fn indicator(&self) -> Indicator {
        Indicator::TemperatureAnomaly
    }

    fn dataset(&self) -> &'static str {
        DATASET
    }

    fn parse(&self, raw: &str) -> Result<TimeSeries, ParseError> {
        let mut seen_header = false;
        let mut observations = Vec::new();
        let required = self.required_values();

        for (idx, line) in raw.lines().enumerate() {
            let line_no = idx + 1;
            let mut tokens = line.split_whitespace();
            let Some(first) = tokens.next() else {
                continue;
            };

            if first == "Year" {
                seen_header = true;
                continue;
            }

            // Preamble and footnotes don't start with a year.
            let year = match first.parse::<i32>() {
                Ok(year) if first.len() == 4 => year,
                _ => continue,
            };
            if !seen_header {
                return Err(ParseError::MissingHeader { dataset: DATASET });
            }

            let values: Vec<&str> = tokens.collect();
            if values.len() < required {
                return Err(ParseError::ColumnCount {
                    dataset: DATASET,
                    line: line_no,
                    expected: required + 1,
                    found: values.len() + 1,
                });
            }

            match self.resolution {
                TemperatureResolution::Monthly => {
                    for (m, name) in MONTHS.iter().enumerate() {
                        let value = anomaly(values[m], line_no, name)?;
                        observations.push(Observation::new(
                            Period::Month {
                                year,
                                month: m as u32 + 1,
                            },
                            value,
                        ));
                    }
                }
                TemperatureResolution::Annual => {
                    let value = anomaly(values[ANNUAL_MEAN_COLUMN], line_no, "J-D")?;
                    observations.push(Observation::new(Period::Year(year), value));
                }
            }
        }

        if !seen_header {
            return Err(ParseError::MissingHeader { dataset: DATASET });
        }
        if observations.is_empty() {
            return Err(ParseError::NoRows {
                dataset: DATASET,
                detail: String::new(),
            });
        }

        let granularity = match self.resolution {
            TemperatureResolution::Monthly => Granularity::Monthly,
            TemperatureResolution::Annual => Granularity::Annual,
        };
        debug!(observations = observations.len(), %granularity, "parsed GISTEMP table");
        Ok(TimeSeries::new(
            Indicator::TemperatureAnomaly,
            granularity,
            observations,
        ))
    }
}
