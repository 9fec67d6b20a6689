//! The merged, time-indexed table produced by the aligner.

use super::indicator::Indicator;
use super::period::{Granularity, Period};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the aligner chooses keys and treats gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Only periods where every series has a value.
    #[default]
    Strict,
    /// Periods where at least one series has a value; gaps stay absent.
    Inclusive,
    /// Inclusive key set; gaps after a series' first value carry it forward,
    /// flagged as filled.
    ForwardFill,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergePolicy::Strict => "strict",
            MergePolicy::Inclusive => "inclusive",
            MergePolicy::ForwardFill => "forward-fill",
        })
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(MergePolicy::Strict),
            "inclusive" => Ok(MergePolicy::Inclusive),
            "forward-fill" | "forward_fill" | "ffill" => Ok(MergePolicy::ForwardFill),
            other => Err(format!(
                "unknown merge policy '{other}' (expected strict, inclusive or forward-fill)"
            )),
        }
    }
}

/// A single field of a merged record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Observed(f64),
    Filled(f64),
    #[default]
    Absent,
}

impl Cell {
    /// Value regardless of provenance.
    pub fn value(&self) -> Option<f64> {
        match self {
            Cell::Observed(v) | Cell::Filled(v) => Some(*v),
            Cell::Absent => None,
        }
    }

    /// Value only if it was actually observed for this period.
    pub fn observed(&self) -> Option<f64> {
        match self {
            Cell::Observed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }
}

/// Fixed-width record: one cell per indicator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClimateRecord {
    pub temperature_anomaly: Cell,
    pub co2_emissions: Cell,
    pub sea_level: Cell,
}

impl ClimateRecord {
    pub fn get(&self, indicator: Indicator) -> Cell {
        match indicator {
            Indicator::TemperatureAnomaly => self.temperature_anomaly,
            Indicator::Co2Emissions => self.co2_emissions,
            Indicator::SeaLevel => self.sea_level,
        }
    }

    pub fn set(&mut self, indicator: Indicator, cell: Cell) {
        match indicator {
            Indicator::TemperatureAnomaly => self.temperature_anomaly = cell,
            Indicator::Co2Emissions => self.co2_emissions = cell,
            Indicator::SeaLevel => self.sea_level = cell,
        }
    }

    /// True when no field is absent.
    pub fn is_complete(&self) -> bool {
        Indicator::ALL.iter().all(|&i| !self.get(i).is_absent())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub period: Period,
    pub record: ClimateRecord,
}

/// Rows sorted ascending by period, no duplicate keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTable {
    policy: MergePolicy,
    granularity: Granularity,
    rows: Vec<MergedRow>,
}

impl MergedTable {
    /// Only the aligner builds tables, which guarantees the ordering invariant.
    pub(crate) fn new(policy: MergePolicy, granularity: Granularity, rows: Vec<MergedRow>) -> Self {
        Self {
            policy,
            granularity,
            rows,
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn periods(&self) -> Vec<Period> {
        self.rows.iter().map(|r| r.period).collect()
    }

    pub fn get(&self, period: Period) -> Option<&ClimateRecord> {
        self.rows
            .binary_search_by(|row| row.period.cmp(&period))
            .ok()
            .map(|i| &self.rows[i].record)
    }

    /// One indicator's cells in row order.
    pub fn column(&self, indicator: Indicator) -> Vec<(Period, Cell)> {
        self.rows
            .iter()
            .map(|row| (row.period, row.record.get(indicator)))
            .collect()
    }

    /// Deterministic BLAKE3 fingerprint over policy, granularity and every cell.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.policy.to_string().as_bytes());
        hasher.update(self.granularity.to_string().as_bytes());

        for row in &self.rows {
            hasher.update(row.period.to_string().as_bytes());
            for indicator in Indicator::ALL {
                match row.record.get(indicator) {
                    Cell::Observed(v) => {
                        hasher.update(b"o");
                        hasher.update(&v.to_le_bytes());
                    }
                    Cell::Filled(v) => {
                        hasher.update(b"f");
                        hasher.update(&v.to_le_bytes());
                    }
                    Cell::Absent => {
                        hasher.update(b"-");
                    }
                }
            }
        }

        hasher.finalize().to_hex().to_string()
    }
}
