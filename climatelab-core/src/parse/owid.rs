//! Our World in Data CO2 dataset (`owid-co2-data.csv`).
//!
//! One row per (country, year) with dozens of columns; only `country`, `year`
//! and `co2` (annual emissions, million tonnes) are used. Rows for aggregate
//! regions sit alongside countries, so the parser keeps a single region.

use super::{column_index, csv_error, csv_reader, optional_number, record_line, ParseError, SeriesParser};
use crate::domain::{Granularity, Indicator, Observation, Period, TimeSeries};
use tracing::debug;

const DATASET: &str = "OWID CO2";
pub const DEFAULT_REGION: &str = "World";

#[derive(Debug, Clone)]
pub struct OwidCo2Parser {
    region: String,
}

impl OwidCo2Parser {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

impl Default for OwidCo2Parser {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl SeriesParser for OwidCo2Parser {
    fn indicator(&self) -> Indicator {
        Indicator::Co2Emissions
    }

    fn dataset(&self) -> &'static str {
        DATASET
    }

    fn parse(&self, raw: &str) -> Result<TimeSeries, ParseError> {
        let mut reader = csv_reader(raw);
        let headers = reader.headers().map_err(|e| csv_error(e, DATASET))?.clone();
        let country_col = column_index(&headers, "country", DATASET)?;
        let year_col = column_index(&headers, "year", DATASET)?;
        let co2_col = column_index(&headers, "co2", DATASET)?;

        let mut observations = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(e, DATASET))?;
            if record.get(country_col) != Some(self.region.as_str()) {
                continue;
            }
            let line = record_line(&record);

            let year_text = record.get(year_col).unwrap_or_default();
            let year = year_text
                .parse::<i32>()
                .map_err(|e| ParseError::InvalidPeriod {
                    dataset: DATASET,
                    line,
                    value: year_text.to_string(),
                    reason: e.to_string(),
                })?;
            let value = optional_number(record.get(co2_col).unwrap_or_default(), DATASET, line, "co2")?;
            observations.push(Observation::new(Period::Year(year), value));
        }

        if observations.is_empty() {
            return Err(ParseError::NoRows {
                dataset: DATASET,
                detail: format!(" for region '{}'", self.region),
            });
        }

        debug!(region = %self.region, observations = observations.len(), "parsed OWID CO2 table");
        Ok(TimeSeries::new(
            Indicator::Co2Emissions,
            Granularity::Annual,
            observations,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
country,year,iso_code,population,co2,co2_per_capita
Afghanistan,2000,AFG,19542986,1.047,0.054
World,1750,,745664000,,
World,1751,,747553000,9.306,0.012
World,2000,,6148898975,25453.623,4.14
";

    #[test]
    fn keeps_only_the_region() {
        let series = OwidCo2Parser::default().parse(SAMPLE).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.observations()[2].period, Period::Year(2000));
        assert_eq!(series.observations()[2].value, Some(25453.623));
    }

    #[test]
    fn empty_co2_is_missing() {
        let series = OwidCo2Parser::default().parse(SAMPLE).unwrap();
        assert_eq!(series.observations()[0].period, Period::Year(1750));
        assert_eq!(series.observations()[0].value, None);
    }

    #[test]
    fn other_region_can_be_selected() {
        let series = OwidCo2Parser::new("Afghanistan").parse(SAMPLE).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn unknown_region_has_no_rows() {
        let err = OwidCo2Parser::new("Atlantis").parse(SAMPLE).unwrap_err();
        assert!(matches!(err, ParseError::NoRows { .. }));
    }

    #[test]
    fn missing_co2_column_is_reported() {
        let err = OwidCo2Parser::default()
            .parse("country,year\nWorld,2000\n")
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingColumn {
                dataset: DATASET,
                column: "co2".into()
            }
        );
    }

    #[test]
    fn ragged_row_is_a_column_count_error() {
        let err = OwidCo2Parser::default()
            .parse("country,year,co2\nWorld,2000\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::ColumnCount {
                line: 2,
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_co2_is_an_error() {
        let err = OwidCo2Parser::default()
            .parse("country,year,co2\nWorld,2000,lots\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { line: 2, .. }));
    }
}
