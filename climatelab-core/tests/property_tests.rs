//! Property tests for alignment invariants.
//!
//! Uses proptest to verify:
//! 1. Strict merges over fully overlapping series have no absent cells
//! 2. Every row of any merge carries at least one value
//! 3. Missing inputs never turn into zeros
//! 4. Out-of-order input is rejected, never silently sorted
//! 5. Disjoint inputs produce NoOverlap under strict

use climatelab_core::align::{align, AlignError, AlignOptions, SeriesSet};
use climatelab_core::domain::{
    Cell, Granularity, Indicator, MergePolicy, Observation, Period, TimeSeries,
};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_value() -> impl Strategy<Value = f64> {
    (-500.0..500.0_f64).prop_map(|v| (v * 100.0).round() / 100.0)
}

/// Sorted distinct years with an optional value each.
fn arb_sparse_series(indicator: Indicator) -> impl Strategy<Value = TimeSeries> {
    proptest::collection::btree_map(1880..2030_i32, proptest::option::of(arb_value()), 1..40)
        .prop_map(move |points| {
            let observations = points
                .into_iter()
                .map(|(year, value)| Observation::new(Period::Year(year), value))
                .collect();
            TimeSeries::new(indicator, Granularity::Annual, observations)
        })
}

fn arb_set() -> impl Strategy<Value = SeriesSet> {
    (
        arb_sparse_series(Indicator::TemperatureAnomaly),
        arb_sparse_series(Indicator::Co2Emissions),
        arb_sparse_series(Indicator::SeaLevel),
    )
        .prop_map(|(temperature, co2, sea_level)| SeriesSet {
            temperature,
            co2,
            sea_level,
        })
}

fn arb_policy() -> impl Strategy<Value = MergePolicy> {
    prop_oneof![
        Just(MergePolicy::Strict),
        Just(MergePolicy::Inclusive),
        Just(MergePolicy::ForwardFill),
    ]
}

fn full(indicator: Indicator, start: i32, values: &[f64]) -> TimeSeries {
    let points: Vec<(i32, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (start + i as i32, v))
        .collect();
    TimeSeries::annual(indicator, &points)
}

// ── 1. Full overlap ──────────────────────────────────────────────────

proptest! {
    /// Same years, all present: strict keeps every year and every cell.
    #[test]
    fn strict_full_overlap_has_no_absent_cells(
        values in proptest::collection::vec((arb_value(), arb_value(), arb_value()), 1..50),
        start in 1880..1950_i32,
    ) {
        let temps: Vec<f64> = values.iter().map(|v| v.0).collect();
        let co2: Vec<f64> = values.iter().map(|v| v.1).collect();
        let sea: Vec<f64> = values.iter().map(|v| v.2).collect();
        let set = SeriesSet {
            temperature: full(Indicator::TemperatureAnomaly, start, &temps),
            co2: full(Indicator::Co2Emissions, start, &co2),
            sea_level: full(Indicator::SeaLevel, start, &sea),
        };

        let table = align(&set, &AlignOptions::default()).unwrap();
        prop_assert_eq!(table.len(), values.len());
        for (row, expected) in table.rows().iter().zip(&values) {
            prop_assert!(row.record.is_complete());
            prop_assert_eq!(row.record.temperature_anomaly, Cell::Observed(expected.0));
            prop_assert_eq!(row.record.co2_emissions, Cell::Observed(expected.1));
            prop_assert_eq!(row.record.sea_level, Cell::Observed(expected.2));
        }
    }
}

// ── 2-3. Rows and missing values ─────────────────────────────────────

proptest! {
    /// No merged row is entirely empty, and keys are strictly increasing.
    #[test]
    fn rows_are_sorted_and_never_empty(set in arb_set(), policy in arb_policy()) {
        match align(&set, &AlignOptions::with_policy(policy)) {
            Ok(table) => {
                for pair in table.rows().windows(2) {
                    prop_assert!(pair[0].period < pair[1].period);
                }
                for row in table.rows() {
                    prop_assert!(Indicator::ALL.iter().any(|&i| !row.record.get(i).is_absent()));
                }
            }
            Err(AlignError::NoOverlap { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// An observed cell always equals the input value at that period.
    #[test]
    fn observed_cells_come_from_inputs(set in arb_set(), policy in arb_policy()) {
        if let Ok(table) = align(&set, &AlignOptions::with_policy(policy)) {
            for indicator in Indicator::ALL {
                let series = set.get(indicator);
                for (period, cell) in table.column(indicator) {
                    if let Cell::Observed(v) = cell {
                        let source = series
                            .observations()
                            .iter()
                            .find(|o| o.period == period)
                            .and_then(|o| o.value);
                        prop_assert_eq!(source, Some(v));
                    }
                }
            }
        }
    }

    /// Periods missing from a series never show up as observed zeros.
    #[test]
    fn missing_is_never_zero(set in arb_set()) {
        if let Ok(table) = align(&set, &AlignOptions::with_policy(MergePolicy::Inclusive)) {
            for indicator in Indicator::ALL {
                let series = set.get(indicator);
                for (period, cell) in table.column(indicator) {
                    let present = series
                        .observations()
                        .iter()
                        .any(|o| o.period == period && o.value.is_some());
                    prop_assert_eq!(present, !cell.is_absent());
                }
            }
        }
    }
}

// ── 4-5. Rejections ──────────────────────────────────────────────────

proptest! {
    /// Swapping two adjacent observations makes the input invalid.
    #[test]
    fn out_of_order_input_is_rejected(
        values in proptest::collection::vec(arb_value(), 2..20),
        swap_at in 0..19_usize,
    ) {
        let swap_at = swap_at % (values.len() - 1);
        let mut observations: Vec<Observation> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Observation::new(Period::Year(2000 + i as i32), Some(v)))
            .collect();
        observations.swap(swap_at, swap_at + 1);

        let set = SeriesSet {
            temperature: full(Indicator::TemperatureAnomaly, 2000, &values),
            co2: TimeSeries::new(Indicator::Co2Emissions, Granularity::Annual, observations),
            sea_level: full(Indicator::SeaLevel, 2000, &values),
        };
        let err = align(&set, &AlignOptions::default()).unwrap_err();
        prop_assert_eq!(err.indicator(), Some(Indicator::Co2Emissions));
        let is_invalid_series = matches!(err, AlignError::InvalidSeries { .. });
        prop_assert!(is_invalid_series);
    }

    /// Series on disjoint year ranges share nothing under strict.
    #[test]
    fn disjoint_ranges_do_not_overlap(
        a in proptest::collection::vec(arb_value(), 1..10),
        b in proptest::collection::vec(arb_value(), 1..10),
    ) {
        let set = SeriesSet {
            temperature: full(Indicator::TemperatureAnomaly, 1900, &a),
            co2: full(Indicator::Co2Emissions, 1950, &b),
            sea_level: full(Indicator::SeaLevel, 1900, &a),
        };
        prop_assert_eq!(
            align(&set, &AlignOptions::default()).unwrap_err(),
            AlignError::NoOverlap { policy: MergePolicy::Strict }
        );
    }
}
