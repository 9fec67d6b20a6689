use super::indicator::Indicator;
use super::period::{Granularity, Period};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One (period, value) pair. `None` is the missing marker; it is never
/// replaced by zero or NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub period: Period,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(period: Period, value: Option<f64>) -> Self {
        Self { period, value }
    }
}

/// Normalized per-source series produced by a parser.
///
/// Construction does not validate; [`TimeSeries::validate`] is run by the
/// aligner so a structurally broken series is reported as a merge failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    indicator: Indicator,
    granularity: Granularity,
    observations: Vec<Observation>,
}

/// Structural problems that make a series unusable for merging.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesViolation {
    #[error("period {current} at index {index} does not follow {previous}")]
    NonMonotonic {
        index: usize,
        previous: Period,
        current: Period,
    },

    #[error("period {period} at index {index} is not {expected}")]
    GranularityMismatch {
        index: usize,
        period: Period,
        expected: Granularity,
    },

    #[error("value at {period} (index {index}) is not finite")]
    NonFiniteValue { index: usize, period: Period },
}

impl TimeSeries {
    pub fn new(
        indicator: Indicator,
        granularity: Granularity,
        observations: Vec<Observation>,
    ) -> Self {
        Self {
            indicator,
            granularity,
            observations,
        }
    }

    /// Annual series from `(year, value)` pairs, all present.
    pub fn annual(indicator: Indicator, points: &[(i32, f64)]) -> Self {
        let observations = points
            .iter()
            .map(|&(year, value)| Observation::new(Period::Year(year), Some(value)))
            .collect();
        Self::new(indicator, Granularity::Annual, observations)
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of observations carrying a value.
    pub fn present_count(&self) -> usize {
        self.observations
            .iter()
            .filter(|o| o.value.is_some())
            .count()
    }

    /// Periods of the first and last present observations.
    pub fn coverage(&self) -> Option<(Period, Period)> {
        let mut present = self.observations.iter().filter(|o| o.value.is_some());
        let first = present.next()?.period;
        let last = present.last().map(|o| o.period).unwrap_or(first);
        Some((first, last))
    }

    /// Check the series invariants: strictly increasing periods, every period
    /// at the declared granularity, every present value finite.
    pub fn validate(&self) -> Result<(), SeriesViolation> {
        let mut previous: Option<Period> = None;
        for (index, obs) in self.observations.iter().enumerate() {
            if obs.period.granularity() != self.granularity {
                return Err(SeriesViolation::GranularityMismatch {
                    index,
                    period: obs.period,
                    expected: self.granularity,
                });
            }
            if let Some(prev) = previous {
                if obs.period <= prev {
                    return Err(SeriesViolation::NonMonotonic {
                        index,
                        previous: prev,
                        current: obs.period,
                    });
                }
            }
            if matches!(obs.value, Some(v) if !v.is_finite()) {
                return Err(SeriesViolation::NonFiniteValue {
                    index,
                    period: obs.period,
                });
            }
            previous = Some(obs.period);
        }
        Ok(())
    }
}
