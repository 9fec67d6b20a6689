//! Pipeline integration tests over the core fixture files.

use climatelab_core::data::{
    DataSource, FetchError, Fetcher, FileFetcher, RawCache, RawDocument, SourceSpec,
};
use climatelab_core::domain::{Indicator, MergePolicy, Period};
use climatelab_runner::{
    run_id, Pipeline, PipelineConfig, PresentError, Presenter, RunOutput, Stage, StageError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("climatelab-core/tests/fixtures")
}

fn config(output: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.output.dir = output.to_path_buf();
    config.output.cache_dir = output.join("cache");
    config
}

/// Fails one indicator, serves the others from the fixtures.
struct FailingFetcher {
    failing: Indicator,
    inner: FileFetcher,
}

impl Fetcher for FailingFetcher {
    fn name(&self) -> &str {
        "failing"
    }

    fn fetch(&self, spec: &SourceSpec) -> Result<RawDocument, FetchError> {
        if spec.indicator == self.failing {
            return Err(FetchError::HttpStatus {
                status: 404,
                url: spec.url.clone(),
            });
        }
        self.inner.fetch(spec)
    }
}

/// Counts calls so cache behaviour can be observed.
struct CountingFetcher {
    calls: Arc<AtomicUsize>,
    inner: FileFetcher,
}

impl Fetcher for CountingFetcher {
    fn name(&self) -> &str {
        "counting"
    }

    fn fetch(&self, spec: &SourceSpec) -> Result<RawDocument, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(spec)
    }
}

/// Keeps the last run in memory instead of writing files.
#[derive(Default)]
struct RecordingPresenter {
    last: Arc<Mutex<Option<RunOutput>>>,
}

impl Presenter for RecordingPresenter {
    fn name(&self) -> &str {
        "recording"
    }

    fn present(&self, run: &RunOutput) -> Result<Vec<PathBuf>, PresentError> {
        *self.last.lock().unwrap() = Some(run.clone());
        Ok(Vec::new())
    }
}

#[test]
fn full_run_over_fixtures_writes_artifacts() {
    let out = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        config(out.path()),
        Box::new(FileFetcher::new(fixtures_dir())),
    );

    let summary = pipeline.run().unwrap();
    assert_eq!(summary.output.table.len(), 3);
    assert_eq!(summary.artifacts.len(), 4);
    for path in &summary.artifacts {
        assert!(path.exists(), "{} missing", path.display());
        assert!(path.starts_with(out.path().join(&summary.output.run_id)));
    }
    assert_eq!(summary.output.sources.len(), 3);
    assert!(summary
        .output
        .sources
        .iter()
        .all(|s| s.source == DataSource::LocalFile));
}

#[test]
fn stages_can_be_driven_one_at_a_time() {
    let out = tempfile::tempdir().unwrap();
    let mut cfg = config(out.path());
    cfg.merge.policy = MergePolicy::Inclusive;
    let pipeline = Pipeline::new(cfg, Box::new(FileFetcher::new(fixtures_dir())));

    let raw = pipeline.fetch().unwrap();
    assert!(raw.get(Indicator::TemperatureAnomaly).text.contains("GLOBAL"));

    let series = pipeline.parse(&raw).unwrap();
    assert_eq!(series.co2.present_count(), 4);

    let table = pipeline.merge(&series).unwrap();
    assert_eq!(table.policy(), MergePolicy::Inclusive);
    assert_eq!(table.periods().first(), Some(&Period::Year(1999)));

    let analysis = pipeline.analyze(&table).unwrap();
    assert_eq!(
        analysis
            .correlations
            .observations(Indicator::Co2Emissions, Indicator::SeaLevel),
        3
    );
}

#[test]
fn failing_fetch_names_stage_and_source() {
    let out = tempfile::tempdir().unwrap();
    let fetcher = FailingFetcher {
        failing: Indicator::Co2Emissions,
        inner: FileFetcher::new(fixtures_dir()),
    };
    let pipeline = Pipeline::new(config(out.path()), Box::new(fetcher));

    let err = pipeline.run().unwrap_err();
    assert_eq!(err.stage, Stage::Fetch);
    assert_eq!(err.indicator, Some(Indicator::Co2Emissions));
    assert!(matches!(
        err.source,
        StageError::Fetch(FetchError::HttpStatus { status: 404, .. })
    ));
    assert!(err
        .to_string()
        .starts_with("stage `fetch` failed for `co2_emissions`"));
    // Nothing was presented.
    assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
}

#[test]
fn first_failure_in_indicator_order_is_reported() {
    let out = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        config(out.path()),
        Box::new(FileFetcher::new(out.path().join("empty"))),
    );
    let err = pipeline.fetch().unwrap_err();
    assert_eq!(err.indicator, Some(Indicator::TemperatureAnomaly));
}

#[test]
fn malformed_source_fails_in_parse_stage() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["temperature_data.txt", "sea_level_data.csv"] {
        std::fs::copy(fixtures_dir().join(name), dir.path().join(name)).unwrap();
    }
    std::fs::write(dir.path().join("co2_data.csv"), "country,year\nWorld,2000\n").unwrap();

    let pipeline = Pipeline::new(config(dir.path()), Box::new(FileFetcher::new(dir.path())));
    let err = pipeline.run().unwrap_err();
    assert_eq!(err.stage, Stage::Parse);
    assert_eq!(err.indicator, Some(Indicator::Co2Emissions));
}

#[test]
fn disjoint_sources_fail_in_merge_stage() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(
        fixtures_dir().join("temperature_data.txt"),
        dir.path().join("temperature_data.txt"),
    )
    .unwrap();
    std::fs::write(dir.path().join("co2_data.csv"), "country,year,co2\nWorld,1950,6000\n").unwrap();
    std::fs::write(
        dir.path().join("sea_level_data.csv"),
        "Year,CSIRO Adjusted Sea Level\n1950-03-15,4.0\n",
    )
    .unwrap();

    let pipeline = Pipeline::new(config(dir.path()), Box::new(FileFetcher::new(dir.path())));
    let err = pipeline.run().unwrap_err();
    assert_eq!(err.stage, Stage::Merge);
    assert_eq!(err.indicator, None);
}

#[test]
fn cache_is_written_then_reused() {
    let out = tempfile::tempdir().unwrap();
    let cfg = config(out.path());
    let calls = Arc::new(AtomicUsize::new(0));
    let make = |force: bool| {
        Pipeline::new(
            cfg.clone(),
            Box::new(CountingFetcher {
                calls: Arc::clone(&calls),
                inner: FileFetcher::new(fixtures_dir()),
            }),
        )
        .with_cache(RawCache::new(&cfg.output.cache_dir))
        .with_presenter(Box::new(RecordingPresenter::default()))
        .force(force)
    };

    make(false).fetch().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let raw = make(false).fetch().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(raw.get(Indicator::SeaLevel).source, DataSource::Cache);

    make(true).fetch().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[test]
fn changed_source_url_is_fetched_again() {
    let out = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let make = |cfg: PipelineConfig, offline: bool| {
        Pipeline::new(
            cfg.clone(),
            Box::new(CountingFetcher {
                calls: Arc::clone(&calls),
                inner: FileFetcher::new(fixtures_dir()),
            }),
        )
        .with_cache(RawCache::new(&cfg.output.cache_dir))
        .with_presenter(Box::new(RecordingPresenter::default()))
        .offline(offline)
    };

    let first = config(out.path());
    make(first.clone(), false).fetch().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let mut moved = first;
    moved.sources.co2.url = "https://mirror.example/owid-co2-data.csv".into();

    // Offline, the old download must not stand in for the new URL.
    let err = make(moved.clone(), true).fetch().unwrap_err();
    assert!(matches!(
        err.source,
        StageError::Fetch(FetchError::NotCached {
            indicator: Indicator::Co2Emissions
        })
    ));

    let raw = make(moved, false).fetch().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(raw.get(Indicator::Co2Emissions).source, DataSource::LocalFile);
    assert_eq!(raw.get(Indicator::SeaLevel).source, DataSource::Cache);
}

#[test]
fn offline_without_cache_is_not_cached() {
    let out = tempfile::tempdir().unwrap();
    let cfg = config(out.path());
    let pipeline = Pipeline::new(cfg.clone(), Box::new(FileFetcher::new(fixtures_dir())))
        .with_cache(RawCache::new(&cfg.output.cache_dir))
        .offline(true);

    let err = pipeline.fetch().unwrap_err();
    assert!(matches!(
        err.source,
        StageError::Fetch(FetchError::NotCached {
            indicator: Indicator::TemperatureAnomaly
        })
    ));
}

#[test]
fn custom_presenter_receives_the_run() {
    let out = tempfile::tempdir().unwrap();
    let presenter = RecordingPresenter::default();
    let last = Arc::clone(&presenter.last);
    let pipeline = Pipeline::new(config(out.path()), Box::new(FileFetcher::new(fixtures_dir())))
        .with_presenter(Box::new(presenter));

    let summary = pipeline.run().unwrap();
    assert!(summary.artifacts.is_empty());
    let recorded = last.lock().unwrap().clone().unwrap();
    assert_eq!(recorded.run_id, summary.output.run_id);
    assert_eq!(
        recorded.run_id,
        run_id(&recorded.table, &recorded.analysis.options)
    );
}
