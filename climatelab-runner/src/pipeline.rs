//! The staged pipeline: fetch → parse → merge → analyze → present.
//!
//! Each stage is a method so it can be driven and tested on its own; [`Pipeline::run`]
//! chains them. Raw document resolution follows this fallback policy:
//! 1. If a cached copy exists and `force` is off → use it
//! 2. If `offline` → fail with [`FetchError::NotCached`]
//! 3. Otherwise → fetch, then write through to the cache
//!
//! The three fetches run concurrently on the rayon pool. Any failure aborts the
//! run; nothing downstream ever sees substituted data.

use crate::config::PipelineConfig;
use crate::reporting::{ArtifactPresenter, PresentError, Presenter};
use crate::result::{RunOutput, SourceProvenance};
use climatelab_core::align::{align, AlignError, SeriesSet};
use climatelab_core::analysis::{analyze, Analysis, AnalysisError};
use climatelab_core::data::{FetchError, Fetcher, RawCache, RawDocument};
use climatelab_core::domain::{Indicator, MergedTable};
use climatelab_core::parse::{parser_for, ParseError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Parse,
    Merge,
    Analyze,
    Present,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Merge => "merge",
            Stage::Analyze => "analyze",
            Stage::Present => "present",
        })
    }
}

/// The underlying failure of a stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Align(#[from] AlignError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Present(#[from] PresentError),
}

/// A failed run: which stage, which source (when attributable), and why.
#[derive(Debug, Error)]
#[error("stage `{stage}` failed{}: {source}", for_indicator(.indicator))]
pub struct PipelineError {
    pub stage: Stage,
    pub indicator: Option<Indicator>,
    #[source]
    pub source: StageError,
}

fn for_indicator(indicator: &Option<Indicator>) -> String {
    indicator
        .map(|i| format!(" for `{i}`"))
        .unwrap_or_default()
}

impl PipelineError {
    fn new(stage: Stage, indicator: Option<Indicator>, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            indicator,
            source: source.into(),
        }
    }
}

/// Raw text of all three sources.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSet {
    pub temperature: RawDocument,
    pub co2: RawDocument,
    pub sea_level: RawDocument,
}

impl RawSet {
    pub fn get(&self, indicator: Indicator) -> &RawDocument {
        match indicator {
            Indicator::TemperatureAnomaly => &self.temperature,
            Indicator::Co2Emissions => &self.co2,
            Indicator::SeaLevel => &self.sea_level,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: RunOutput,
    /// Files written by the presenter.
    pub artifacts: Vec<PathBuf>,
}

pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Box<dyn Fetcher>,
    cache: Option<RawCache>,
    presenter: Box<dyn Presenter>,
    offline: bool,
    force: bool,
}

impl Pipeline {
    /// A pipeline writing artifacts under `config.output.dir`, without a cache.
    pub fn new(config: PipelineConfig, fetcher: Box<dyn Fetcher>) -> Self {
        let presenter = Box::new(ArtifactPresenter::new(&config.output.dir));
        Self {
            config,
            fetcher,
            cache: None,
            presenter,
            offline: false,
            force: false,
        }
    }

    pub fn with_cache(mut self, cache: RawCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Never touch the fetcher; every source must come from the cache.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Ignore cached copies and fetch again.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve one source's raw document.
    fn resolve(&self, indicator: Indicator) -> Result<RawDocument, FetchError> {
        let spec = self.config.sources.spec(indicator);

        if !self.force {
            if let Some(cache) = &self.cache {
                match cache.load(&spec) {
                    Ok(doc) => {
                        info!(%indicator, "using cached copy");
                        return Ok(doc);
                    }
                    Err(FetchError::NotCached { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
        }

        if self.offline {
            return Err(FetchError::NotCached { indicator });
        }

        debug!(%indicator, fetcher = self.fetcher.name(), "fetching");
        let doc = self.fetcher.fetch(&spec)?;

        if let Some(cache) = &self.cache {
            // A failed cache write costs a re-download next time, nothing more.
            if let Err(e) = cache.write(&spec, &doc) {
                warn!(%indicator, error = %e, "failed to cache raw document");
            }
        }
        Ok(doc)
    }

    pub fn fetch(&self) -> Result<RawSet, PipelineError> {
        let started = Instant::now();
        let results: Vec<(Indicator, Result<RawDocument, FetchError>)> = Indicator::ALL
            .par_iter()
            .map(|&indicator| (indicator, self.resolve(indicator)))
            .collect();

        // collect() keeps input order, so the first error is in Indicator order.
        let mut docs = Vec::with_capacity(results.len());
        for (indicator, result) in results {
            let doc = result.map_err(|e| PipelineError::new(Stage::Fetch, Some(indicator), e))?;
            docs.push(doc);
        }
        let [temperature, co2, sea_level]: [RawDocument; 3] = docs.try_into().map_err(|_| {
            PipelineError::new(
                Stage::Fetch,
                None,
                FetchError::Cache("source count mismatch".into()),
            )
        })?;

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "fetched all sources");
        Ok(RawSet {
            temperature,
            co2,
            sea_level,
        })
    }

    pub fn parse(&self, raw: &RawSet) -> Result<SeriesSet, PipelineError> {
        let settings = self.config.sources.parser_settings();
        let parse_one = |indicator: Indicator| {
            let series = parser_for(indicator, &settings)
                .parse(&raw.get(indicator).text)
                .map_err(|e| PipelineError::new(Stage::Parse, Some(indicator), e))?;
            info!(
                %indicator,
                observations = series.len(),
                present = series.present_count(),
                granularity = %series.granularity(),
                "parsed"
            );
            Ok::<_, PipelineError>(series)
        };

        Ok(SeriesSet {
            temperature: parse_one(Indicator::TemperatureAnomaly)?,
            co2: parse_one(Indicator::Co2Emissions)?,
            sea_level: parse_one(Indicator::SeaLevel)?,
        })
    }

    pub fn merge(&self, set: &SeriesSet) -> Result<MergedTable, PipelineError> {
        let table = align(set, &self.config.merge)
            .map_err(|e| PipelineError::new(Stage::Merge, e.indicator(), e))?;
        info!(
            policy = %table.policy(),
            granularity = %table.granularity(),
            rows = table.len(),
            "merged"
        );
        Ok(table)
    }

    pub fn analyze(&self, table: &MergedTable) -> Result<Analysis, PipelineError> {
        let analysis = analyze(table, &self.config.analysis)
            .map_err(|e| PipelineError::new(Stage::Analyze, None, e))?;
        for (a, b) in Indicator::PAIRS {
            debug!(
                pair = %format!("{a}/{b}"),
                r = analysis.correlations.get(a, b),
                n = analysis.correlations.observations(a, b),
                "correlation"
            );
        }
        Ok(analysis)
    }

    pub fn present(&self, output: &RunOutput) -> Result<Vec<PathBuf>, PipelineError> {
        let files = self
            .presenter
            .present(output)
            .map_err(|e| PipelineError::new(Stage::Present, None, e))?;
        info!(presenter = self.presenter.name(), files = files.len(), "presented");
        Ok(files)
    }

    /// Run every stage in order.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        info!(policy = %self.config.merge.policy, offline = self.offline, force = self.force, "starting run");

        let raw = self.fetch()?;
        let series = self.parse(&raw)?;
        let table = self.merge(&series)?;
        let analysis = self.analyze(&table)?;

        let sources = Indicator::ALL
            .iter()
            .map(|&i| SourceProvenance::new(raw.get(i), series.get(i)))
            .collect();
        let output = RunOutput::new(table, analysis, sources);
        let artifacts = self.present(&output)?;

        info!(run_id = %output.run_id, "run complete");
        Ok(RunSummary { output, artifacts })
    }
}
