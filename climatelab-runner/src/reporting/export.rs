//! Export orchestrator for artifacts and reports.

use super::artifacts::{ArtifactManager, ArtifactPaths, REPORT_MD};
use super::reports::MarkdownReportGenerator;
use super::{write_file, PresentError, Presenter};
use crate::result::RunOutput;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes `merged.csv`, `analysis.json`, `report.md` and `manifest.json`
/// into a per-run directory.
#[derive(Debug, Clone)]
pub struct ArtifactPresenter {
    manager: ArtifactManager,
    include_report: bool,
}

impl ArtifactPresenter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            manager: ArtifactManager::new(output_dir),
            include_report: true,
        }
    }

    pub fn with_report(mut self, include_report: bool) -> Self {
        self.include_report = include_report;
        self
    }

    pub fn output_dir(&self) -> &Path {
        self.manager.output_dir()
    }

    pub fn export(&self, run: &RunOutput) -> Result<ArtifactPaths, PresentError> {
        let mut paths = self.manager.save_data(run)?;

        if self.include_report {
            let report = MarkdownReportGenerator.generate(run);
            paths.report_markdown = Some(write_file(paths.run_dir.join(REPORT_MD), &report)?);
        }

        self.manager.save_manifest(run, &paths)?;
        info!(run_id = %run.run_id, dir = %paths.run_dir.display(), "artifacts written");
        Ok(paths)
    }
}

impl Presenter for ArtifactPresenter {
    fn name(&self) -> &str {
        "artifacts"
    }

    fn present(&self, run: &RunOutput) -> Result<Vec<PathBuf>, PresentError> {
        self.export(run).map(|paths| paths.files())
    }
}
