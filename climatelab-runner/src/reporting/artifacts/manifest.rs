//! Run manifest export (JSON).

use crate::reporting::PresentError;
use crate::result::{RunOutput, SourceProvenance, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use climatelab_core::domain::{Granularity, MergePolicy, Period};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub policy: MergePolicy,
    pub granularity: Granularity,
    pub rows: usize,
    pub first_period: Option<Period>,
    pub last_period: Option<Period>,
    pub sources: Vec<SourceProvenance>,
    /// File names written next to the manifest.
    pub artifacts: Vec<String>,
}

impl RunManifest {
    pub fn from_run(run: &RunOutput, artifacts: Vec<String>) -> Self {
        let rows = run.table.rows();
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: run.run_id.clone(),
            created_at: run.created_at,
            policy: run.table.policy(),
            granularity: run.table.granularity(),
            rows: rows.len(),
            first_period: rows.first().map(|r| r.period),
            last_period: rows.last().map(|r| r.period),
            sources: run.sources.clone(),
            artifacts,
        }
    }
}

pub fn manifest_json(manifest: &RunManifest) -> Result<String, PresentError> {
    serde_json::to_string_pretty(manifest).map_err(|source| PresentError::Json {
        artifact: "manifest.json",
        source,
    })
}

/// Read a manifest back from a run directory, rejecting unknown schema versions.
pub fn load_manifest(run_dir: &Path) -> Result<RunManifest, PresentError> {
    let path = run_dir.join("manifest.json");
    let json = std::fs::read_to_string(&path).map_err(|source| PresentError::Read {
        path: path.clone(),
        source,
    })?;
    let manifest: RunManifest =
        serde_json::from_str(&json).map_err(|source| PresentError::Json {
            artifact: "manifest.json",
            source,
        })?;
    if manifest.schema_version > SCHEMA_VERSION {
        return Err(PresentError::SchemaVersion {
            found: manifest.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(manifest)
}
