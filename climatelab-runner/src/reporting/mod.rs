//! Presentation of a finished run: artifact files and the markdown report.
//!
//! The presenter only renders; every number it prints was computed by the
//! analyzer. [`Presenter`] is the seam so a run can be rendered somewhere
//! other than the filesystem.

pub mod artifacts;
pub mod export;
pub mod reports;

pub use artifacts::{ArtifactPaths, RunManifest};
pub use export::ArtifactPresenter;
pub use reports::MarkdownReportGenerator;

use crate::result::RunOutput;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {artifact}: {source}")]
    Json {
        artifact: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {artifact}: {source}")]
    Csv {
        artifact: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("unsupported schema version {found} (max supported: {supported})")]
    SchemaVersion { found: u32, supported: u32 },
}

/// Renders a finished run.
pub trait Presenter: Send + Sync {
    /// Human-readable name of this presenter.
    fn name(&self) -> &str;

    /// Render the run; returns the files written, if any.
    fn present(&self, run: &RunOutput) -> Result<Vec<PathBuf>, PresentError>;
}

pub(crate) fn write_file(path: PathBuf, contents: &str) -> Result<PathBuf, PresentError> {
    std::fs::write(&path, contents).map_err(|source| PresentError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
