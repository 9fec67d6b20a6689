//! Granularity reduction by mean aggregation.

use crate::domain::{Granularity, Observation, Period, TimeSeries};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot resample {from} series to finer {to} granularity")]
pub struct ResampleError {
    pub from: Granularity,
    pub to: Granularity,
}

/// Reduce `series` to `target` granularity.
///
/// Each target bucket takes the mean of the present values that fall inside
/// it, whatever the number of levels between native and target. A bucket
/// holding fewer than `min_periods` present values is emitted as missing, so
/// gaps survive resampling instead of being averaged away. With `None` a
/// bucket must be complete: all 12 months of a year, every day of a month.
/// A series already at `target` is returned unchanged.
pub fn resample(
    series: &TimeSeries,
    target: Granularity,
    min_periods: Option<usize>,
) -> Result<TimeSeries, ResampleError> {
    if series.granularity() == target {
        return Ok(series.clone());
    }
    if target < series.granularity() {
        return Err(ResampleError {
            from: series.granularity(),
            to: target,
        });
    }

    // bucket -> (sum, present count)
    let mut buckets: BTreeMap<Period, (f64, usize)> = BTreeMap::new();
    for obs in series.observations() {
        let bucket = obs.period.coarsen(target).ok_or(ResampleError {
            from: obs.period.granularity(),
            to: target,
        })?;
        let entry = buckets.entry(bucket).or_insert((0.0, 0));
        if let Some(value) = obs.value {
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let native = series.granularity();
    let observations = buckets
        .into_iter()
        .map(|(period, (sum, count))| {
            let required = min_periods
                .or_else(|| period.sub_periods(native))
                .unwrap_or(1);
            let value = (count > 0 && count >= required).then(|| sum / count as f64);
            Observation::new(period, value)
        })
        .collect();

    Ok(TimeSeries::new(series.indicator(), target, observations))
}
