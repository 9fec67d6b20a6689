//! Artifact manager for persisting run outputs.

mod manifest;
mod merged;

pub use manifest::{load_manifest, manifest_json, RunManifest};
pub use merged::merged_csv;

use super::{write_file, PresentError};
use crate::result::RunOutput;
use std::path::{Path, PathBuf};

pub const MERGED_CSV: &str = "merged.csv";
pub const ANALYSIS_JSON: &str = "analysis.json";
pub const REPORT_MD: &str = "report.md";
pub const MANIFEST_JSON: &str = "manifest.json";

/// Artifact paths returned after export.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub merged_csv: PathBuf,
    pub analysis_json: PathBuf,
    pub manifest: PathBuf,
    pub report_markdown: Option<PathBuf>,
}

impl ArtifactPaths {
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.merged_csv.clone(), self.analysis_json.clone()];
        files.extend(self.report_markdown.clone());
        files.push(self.manifest.clone());
        files
    }
}

/// Manages writing all artifacts for a run under `{output_dir}/{run_id}/`.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn run_dir(&self, run: &RunOutput) -> PathBuf {
        self.output_dir.join(&run.run_id)
    }

    /// Write the data artifacts. The manifest is written separately, last,
    /// so that it can list every file that made it to disk.
    pub fn save_data(&self, run: &RunOutput) -> Result<ArtifactPaths, PresentError> {
        let run_dir = self.run_dir(run);
        std::fs::create_dir_all(&run_dir).map_err(|source| PresentError::CreateDir {
            path: run_dir.clone(),
            source,
        })?;

        let merged_csv = write_file(run_dir.join(MERGED_CSV), &merged_csv(&run.table)?)?;

        let analysis = serde_json::to_string_pretty(&run.analysis).map_err(|source| {
            PresentError::Json {
                artifact: ANALYSIS_JSON,
                source,
            }
        })?;
        let analysis_json = write_file(run_dir.join(ANALYSIS_JSON), &analysis)?;

        Ok(ArtifactPaths {
            manifest: run_dir.join(MANIFEST_JSON),
            run_dir,
            merged_csv,
            analysis_json,
            report_markdown: None,
        })
    }

    pub fn save_manifest(&self, run: &RunOutput, paths: &ArtifactPaths) -> Result<(), PresentError> {
        let artifacts = paths
            .files()
            .iter()
            .filter(|p| **p != paths.manifest)
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        let manifest = RunManifest::from_run(run, artifacts);
        write_file(paths.manifest.clone(), &manifest_json(&manifest)?)?;
        Ok(())
    }
}
