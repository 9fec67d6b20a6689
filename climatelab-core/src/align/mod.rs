//! Multi-source time alignment.
//!
//! Given one series per indicator, reconcile them onto a common period axis:
//! validate, reduce everything to the coarsest granularity present, choose the
//! key set by [`MergePolicy`], then look each series up key-for-key. A gap is
//! [`Cell::Absent`] unless the policy is forward-fill, in which case it becomes
//! [`Cell::Filled`]. Nothing is ever zero-filled.

pub mod resample;

pub use resample::{resample, ResampleError};

use crate::domain::{
    Cell, ClimateRecord, Granularity, Indicator, MergePolicy, MergedRow, MergedTable, Period,
    SeriesViolation, TimeSeries,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// The three parsed inputs, one per indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    pub temperature: TimeSeries,
    pub co2: TimeSeries,
    pub sea_level: TimeSeries,
}

impl SeriesSet {
    pub fn get(&self, indicator: Indicator) -> &TimeSeries {
        match indicator {
            Indicator::TemperatureAnomaly => &self.temperature,
            Indicator::Co2Emissions => &self.co2,
            Indicator::SeaLevel => &self.sea_level,
        }
    }
}

/// Merge configuration, resolved once before the merge runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignOptions {
    pub policy: MergePolicy,
    /// Present values a resampled bucket needs to count as present. Unset,
    /// a bucket needs every finer period it spans, so a year with only a few
    /// published months stays absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_periods: Option<usize>,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            policy: MergePolicy::Strict,
            min_periods: None,
        }
    }
}

impl AlignOptions {
    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignError {
    #[error("invalid {indicator} series: {violation}")]
    InvalidSeries {
        indicator: Indicator,
        #[source]
        violation: SeriesViolation,
    },

    #[error("{policy} merge produced no rows: the series share no periods")]
    NoOverlap { policy: MergePolicy },

    #[error("cannot resample {indicator} series: {source}")]
    Resample {
        indicator: Indicator,
        #[source]
        source: ResampleError,
    },
}

impl AlignError {
    /// The indicator responsible, if the failure is attributable to one input.
    pub fn indicator(&self) -> Option<Indicator> {
        match self {
            AlignError::InvalidSeries { indicator, .. } | AlignError::Resample { indicator, .. } => {
                Some(*indicator)
            }
            AlignError::NoOverlap { .. } => None,
        }
    }
}

/// Merge three series into one table.
pub fn align(set: &SeriesSet, options: &AlignOptions) -> Result<MergedTable, AlignError> {
    for indicator in Indicator::ALL {
        set.get(indicator)
            .validate()
            .map_err(|violation| AlignError::InvalidSeries {
                indicator,
                violation,
            })?;
    }

    let target = target_granularity(set);

    // Present values only, keyed by target period.
    let mut columns: Vec<BTreeMap<Period, f64>> = Vec::with_capacity(Indicator::ALL.len());
    for indicator in Indicator::ALL {
        let resampled = resample(set.get(indicator), target, options.min_periods)
            .map_err(|source| AlignError::Resample { indicator, source })?;
        let column: BTreeMap<Period, f64> = resampled
            .observations()
            .iter()
            .filter_map(|obs| obs.value.map(|v| (obs.period, v)))
            .collect();
        debug!(%indicator, native = %set.get(indicator).granularity(), %target, present = column.len(), "resampled series");
        columns.push(column);
    }

    let keys = select_keys(&columns, options.policy);
    if keys.is_empty() {
        return Err(AlignError::NoOverlap {
            policy: options.policy,
        });
    }

    let mut last_seen: [Option<f64>; 3] = [None; 3];
    let mut rows = Vec::with_capacity(keys.len());

    for period in keys {
        let mut record = ClimateRecord::default();
        for indicator in Indicator::ALL {
            let slot = indicator.index();
            let cell = match columns[slot].get(&period) {
                Some(&value) => {
                    last_seen[slot] = Some(value);
                    Cell::Observed(value)
                }
                None => match (options.policy, last_seen[slot]) {
                    (MergePolicy::ForwardFill, Some(value)) => Cell::Filled(value),
                    _ => Cell::Absent,
                },
            };
            record.set(indicator, cell);
        }
        rows.push(MergedRow { period, record });
    }

    debug!(policy = %options.policy, rows = rows.len(), "aligned series");
    Ok(MergedTable::new(options.policy, target, rows))
}

/// The coarsest granularity among the inputs.
pub fn target_granularity(set: &SeriesSet) -> Granularity {
    Indicator::ALL
        .iter()
        .map(|&i| set.get(i).granularity())
        .max()
        .unwrap_or(Granularity::Annual)
}

fn select_keys(columns: &[BTreeMap<Period, f64>], policy: MergePolicy) -> BTreeSet<Period> {
    match policy {
        MergePolicy::Strict => match columns.split_first() {
            Some((first, rest)) => first
                .keys()
                .filter(|period| rest.iter().all(|c| c.contains_key(period)))
                .copied()
                .collect(),
            None => BTreeSet::new(),
        },
        MergePolicy::Inclusive | MergePolicy::ForwardFill => {
            columns.iter().flat_map(|c| c.keys().copied()).collect()
        }
    }
}
