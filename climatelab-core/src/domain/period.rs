//! Time keys and the date-normalization helpers shared by parsers and the aligner.
//!
//! A [`Period`] is a calendar bucket at one [`Granularity`]. Sources publish at
//! different granularities (GISTEMP monthly, OWID and EPA annual); everything
//! is normalized onto periods so that series can be compared key-for-key.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Period unit, ordered finest → coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Monthly,
    Annual,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Daily => "daily",
            Granularity::Monthly => "monthly",
            Granularity::Annual => "annual",
        })
    }
}

/// A calendar bucket. Within one series all periods share a granularity, so the
/// derived ordering (variant first, then fields) is chronological there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Period {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    Year(i32),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeriodError {
    #[error("month {month} is out of range 1-12")]
    InvalidMonth { month: u32 },

    #[error("cannot interpret '{0}' as a year or date")]
    Unparseable(String),

    #[error("'{text}' is coarser than the requested {requested} granularity")]
    TooCoarse { text: String, requested: Granularity },
}

impl Period {
    /// Monthly period with a validated month number.
    pub fn month(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth { month });
        }
        Ok(Period::Month { year, month })
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Period::Day(_) => Granularity::Daily,
            Period::Month { .. } => Granularity::Monthly,
            Period::Year(_) => Granularity::Annual,
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            Period::Day(date) => date.year(),
            Period::Month { year, .. } => *year,
            Period::Year(year) => *year,
        }
    }

    /// Map this period onto the bucket containing it at a coarser (or equal)
    /// granularity. Returns `None` when `target` is finer than `self`.
    pub fn coarsen(self, target: Granularity) -> Option<Period> {
        if target < self.granularity() {
            return None;
        }
        Some(match (self, target) {
            (p, g) if p.granularity() == g => p,
            (Period::Day(date), Granularity::Monthly) => Period::Month {
                year: date.year(),
                month: date.month(),
            },
            (p, _) => Period::Year(p.year()),
        })
    }

    /// How many `finer` periods make up this one: 12 months in a year, 28 to
    /// 31 days in a month. `None` when `finer` is not strictly finer.
    pub fn sub_periods(&self, finer: Granularity) -> Option<usize> {
        match (self, finer) {
            (Period::Year(_), Granularity::Monthly) => Some(12),
            (Period::Year(year), Granularity::Daily) => {
                let leap = NaiveDate::from_ymd_opt(*year, 1, 1)?.leap_year();
                Some(if leap { 366 } else { 365 })
            }
            (Period::Month { year, month }, Granularity::Daily) => {
                let first = NaiveDate::from_ymd_opt(*year, *month, 1)?;
                let next = if *month == 12 {
                    NaiveDate::from_ymd_opt(*year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(*year, *month + 1, 1)?
                };
                usize::try_from((next - first).num_days()).ok()
            }
            _ => None,
        }
    }

    /// Fractional-year position of the period start, used as the x-axis for
    /// trend fitting. `Year(2000)` is 2000.0, `Month{2000, 7}` is 2000.5.
    pub fn ordinal(&self) -> f64 {
        match self {
            Period::Year(year) => f64::from(*year),
            Period::Month { year, month } => f64::from(*year) + f64::from(month - 1) / 12.0,
            Period::Day(date) => {
                let days_in_year = if date.leap_year() { 366.0 } else { 365.0 };
                f64::from(date.year()) + f64::from(date.ordinal0()) / days_in_year
            }
        }
    }

    /// Parse a source timestamp and normalize it to `granularity`.
    ///
    /// Accepts bare years (`1993`), year-months (`1993-04`) and ISO dates
    /// (`1880-03-15`). A timestamp coarser than the requested granularity
    /// cannot be refined and is rejected.
    pub fn parse_as(text: &str, granularity: Granularity) -> Result<Period, PeriodError> {
        let native: Period = text.parse()?;
        native.coarsen(granularity).ok_or_else(|| PeriodError::TooCoarse {
            text: text.trim().to_string(),
            requested: granularity,
        })
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    /// The granularity is inferred from the shape of the text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let unparseable = || PeriodError::Unparseable(text.to_string());

        if let Ok(year) = text.parse::<i32>() {
            return Ok(Period::Year(year));
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(Period::Day(date));
        }
        // Bare "YYYY-MM"
        let (year, month) = text.split_once('-').ok_or_else(unparseable)?;
        let year = year.parse::<i32>().map_err(|_| unparseable())?;
        let month = month.parse::<u32>().map_err(|_| unparseable())?;
        Period::month(year, month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Period::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            Period::Year(year) => write!(f, "{year}"),
        }
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
