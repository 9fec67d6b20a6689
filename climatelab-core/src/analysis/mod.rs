//! Descriptive statistics over a merged table.
//!
//! Every statistic is a pure function of the table; nothing here touches I/O.
//! Correlations use pairwise-complete observations: a period contributes to a
//! pair only when both fields are present.

pub mod correlation;
pub mod summary;
pub mod trend;

pub use correlation::{pearson, CorrelationMatrix};
pub use summary::{rolling_mean, summarize, SummaryStats};
pub use trend::{linear_fit, TrendLine};

use crate::domain::{Cell, Indicator, MergedTable, Period};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient data for {subject}: need {required} observations, found {found}")]
    InsufficientData {
        subject: String,
        required: usize,
        found: usize,
    },

    #[error("{subject} has zero variance; the statistic is undefined")]
    ZeroVariance { subject: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Ignore forward-filled cells.
    pub observed_only: bool,
    /// Window (in periods) for the rolling mean.
    pub rolling_window: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            observed_only: false,
            rolling_window: 5,
        }
    }
}

/// Per-indicator statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorAnalysis {
    pub summary: SummaryStats,
    pub trend: TrendLine,
    /// Rolling mean aligned with the table rows.
    pub rolling_mean: Vec<(Period, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub correlations: CorrelationMatrix,
    pub indicators: BTreeMap<Indicator, IndicatorAnalysis>,
    pub options: AnalysisOptions,
}

impl Analysis {
    pub fn indicator(&self, indicator: Indicator) -> Option<&IndicatorAnalysis> {
        self.indicators.get(&indicator)
    }
}

/// Compute correlations, trends, summaries and rolling means.
pub fn analyze(table: &MergedTable, options: &AnalysisOptions) -> Result<Analysis, AnalysisError> {
    let pick = |cell: Cell| {
        if options.observed_only {
            cell.observed()
        } else {
            cell.value()
        }
    };

    let mut correlations = CorrelationMatrix::new();
    for (a, b) in Indicator::PAIRS {
        let (xs, ys): (Vec<f64>, Vec<f64>) = table
            .rows()
            .iter()
            .filter_map(|row| Some((pick(row.record.get(a))?, pick(row.record.get(b))?)))
            .unzip();
        let subject = format!("{a} vs {b}");
        let r = pearson(&xs, &ys, &subject)?;
        correlations.set(a, b, r, xs.len());
    }

    let mut indicators = BTreeMap::new();
    for indicator in Indicator::ALL {
        let column: Vec<(Period, Option<f64>)> = table
            .column(indicator)
            .into_iter()
            .map(|(period, cell)| (period, pick(cell)))
            .collect();
        let present: Vec<(Period, f64)> = column
            .iter()
            .filter_map(|&(period, value)| value.map(|v| (period, v)))
            .collect();

        let subject = indicator.as_str();
        let summary = summarize(&present, subject)?;
        let fit_points: Vec<(f64, f64)> = present.iter().map(|(p, v)| (p.ordinal(), *v)).collect();
        let trend = linear_fit(&fit_points, subject)?;

        let values: Vec<Option<f64>> = column.iter().map(|c| c.1).collect();
        let rolling = rolling_mean(&values, options.rolling_window);

        let idx = indicator.index();
        correlations.observations[idx][idx] = summary.count;

        indicators.insert(
            indicator,
            IndicatorAnalysis {
                summary,
                trend,
                rolling_mean: column.iter().map(|c| c.0).zip(rolling).collect(),
            },
        );
    }

    Ok(Analysis {
        correlations,
        indicators,
        options: *options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{align, AlignOptions, SeriesSet};
    use crate::domain::{MergePolicy, TimeSeries};

    fn linear_set() -> SeriesSet {
        let years: Vec<i32> = (2000..2010).collect();
        let series = |indicator, f: fn(f64) -> f64| {
            let points: Vec<(i32, f64)> = years.iter().map(|&y| (y, f(f64::from(y)))).collect();
            TimeSeries::annual(indicator, &points)
        };
        SeriesSet {
            temperature: series(Indicator::TemperatureAnomaly, |y| 0.02 * (y - 2000.0)),
            co2: series(Indicator::Co2Emissions, |y| 2.0 * 0.02 * (y - 2000.0) + 300.0),
            sea_level: series(Indicator::SeaLevel, |y| 10.0 - 0.1 * (y - 2000.0)),
        }
    }

    #[test]
    fn linear_inputs_give_unit_correlations() {
        let table = align(&linear_set(), &AlignOptions::default()).unwrap();
        let analysis = analyze(&table, &AnalysisOptions::default()).unwrap();

        let c = &analysis.correlations;
        assert!((c.get(Indicator::TemperatureAnomaly, Indicator::Co2Emissions) - 1.0).abs() < 1e-9);
        assert!((c.get(Indicator::TemperatureAnomaly, Indicator::SeaLevel) + 1.0).abs() < 1e-9);
        assert_eq!(
            c.observations(Indicator::Co2Emissions, Indicator::SeaLevel),
            10
        );

        let temp = analysis.indicator(Indicator::TemperatureAnomaly).unwrap();
        assert!((temp.trend.slope - 0.02).abs() < 1e-9);
        assert_eq!(temp.summary.count, 10);
        assert_eq!(temp.rolling_mean.len(), 10);
        assert_eq!(temp.rolling_mean[3].1, None);
        assert!(temp.rolling_mean[4].1.is_some());
    }

    #[test]
    fn pairwise_complete_skips_absent_rows() {
        let mut set = linear_set();
        set.sea_level = TimeSeries::annual(Indicator::SeaLevel, &[(2000, 1.0), (2001, 2.0), (2002, 4.0)]);
        let table = align(&set, &AlignOptions::with_policy(MergePolicy::Inclusive)).unwrap();
        let analysis = analyze(&table, &AnalysisOptions::default()).unwrap();

        let c = &analysis.correlations;
        assert_eq!(c.observations(Indicator::TemperatureAnomaly, Indicator::SeaLevel), 3);
        assert_eq!(
            c.observations(Indicator::TemperatureAnomaly, Indicator::Co2Emissions),
            10
        );
    }

    #[test]
    fn single_shared_period_is_insufficient() {
        let set = SeriesSet {
            temperature: TimeSeries::annual(Indicator::TemperatureAnomaly, &[(2000, 0.5), (2001, 0.6)]),
            co2: TimeSeries::annual(Indicator::Co2Emissions, &[(2000, 370.0), (2001, 372.0)]),
            sea_level: TimeSeries::annual(Indicator::SeaLevel, &[(2000, 3.0)]),
        };
        let table = align(&set, &AlignOptions::with_policy(MergePolicy::Strict)).unwrap();
        let err = analyze(&table, &AnalysisOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { found: 1, .. }));
    }

    #[test]
    fn observed_only_ignores_filled_cells() {
        let set = SeriesSet {
            temperature: TimeSeries::annual(
                Indicator::TemperatureAnomaly,
                &[(2000, 0.1), (2001, 0.2), (2002, 0.3)],
            ),
            co2: TimeSeries::annual(Indicator::Co2Emissions, &[(2000, 1.0), (2001, 2.0), (2002, 3.5)]),
            sea_level: TimeSeries::annual(Indicator::SeaLevel, &[(2000, 1.0), (2001, 3.0)]),
        };
        let table = align(&set, &AlignOptions::with_policy(MergePolicy::ForwardFill)).unwrap();

        let all = analyze(&table, &AnalysisOptions::default()).unwrap();
        assert_eq!(
            all.correlations
                .observations(Indicator::TemperatureAnomaly, Indicator::SeaLevel),
            3
        );

        let observed = analyze(
            &table,
            &AnalysisOptions {
                observed_only: true,
                ..AnalysisOptions::default()
            },
        )
        .unwrap();
        assert_eq!(
            observed
                .correlations
                .observations(Indicator::TemperatureAnomaly, Indicator::SeaLevel),
            2
        );
    }
}
