//! ClimateLab Runner: pipeline orchestration, configuration, artifact export.
//!
//! This crate builds on `climatelab-core` to provide:
//! - TOML pipeline configuration with validation
//! - The staged pipeline (fetch → parse → merge → analyze → present) with
//!   cache/offline/force resolution of raw documents
//! - Run artifacts: merged CSV, analysis JSON, markdown report, manifest

pub mod config;
pub mod pipeline;
pub mod reporting;
pub mod result;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{Pipeline, PipelineError, RawSet, RunSummary, Stage, StageError};
pub use reporting::{ArtifactPaths, ArtifactPresenter, PresentError, Presenter, RunManifest};
pub use result::{run_id, RunOutput, SourceProvenance, SCHEMA_VERSION};
