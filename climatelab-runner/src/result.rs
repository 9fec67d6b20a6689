//! What a completed run hands to the presenter.

use chrono::{DateTime, NaiveDateTime, Utc};
use climatelab_core::analysis::{Analysis, AnalysisOptions};
use climatelab_core::data::{DataSource, RawDocument};
use climatelab_core::domain::{Indicator, MergedTable, TimeSeries};
use serde::{Deserialize, Serialize};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Where one indicator's data came from and how much of it survived parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProvenance {
    pub indicator: Indicator,
    pub origin: String,
    pub source: DataSource,
    /// BLAKE3 of the raw document text.
    pub content_hash: String,
    pub bytes: usize,
    pub fetched_at: NaiveDateTime,
    pub observations: usize,
    pub present: usize,
}

impl SourceProvenance {
    pub fn new(doc: &RawDocument, series: &TimeSeries) -> Self {
        Self {
            indicator: doc.indicator,
            origin: doc.origin.clone(),
            source: doc.source,
            content_hash: doc.content_hash(),
            bytes: doc.text.len(),
            fetched_at: doc.fetched_at,
            observations: series.len(),
            present: series.present_count(),
        }
    }
}

/// Identity of a run: BLAKE3 over the merged table's fingerprint and the
/// analysis options. Runs over the same table analyzed differently land in
/// different directories; identical runs share one.
pub fn run_id(table: &MergedTable, options: &AnalysisOptions) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(table.fingerprint().as_bytes());
    hasher.update(&[u8::from(options.observed_only)]);
    hasher.update(&(options.rolling_window as u64).to_le_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Merged table, analysis and provenance of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// See [`run_id`].
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub table: MergedTable,
    pub analysis: Analysis,
    pub sources: Vec<SourceProvenance>,
}

impl RunOutput {
    pub fn new(table: MergedTable, analysis: Analysis, sources: Vec<SourceProvenance>) -> Self {
        Self {
            run_id: run_id(&table, &analysis.options),
            created_at: Utc::now(),
            table,
            analysis,
            sources,
        }
    }

    pub fn source(&self, indicator: Indicator) -> Option<&SourceProvenance> {
        self.sources.iter().find(|s| s.indicator == indicator)
    }
}
