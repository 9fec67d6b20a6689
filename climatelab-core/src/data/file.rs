use super::provider::{DataSource, FetchError, Fetcher, RawDocument, SourceSpec};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads raw documents from a local directory, one file per source
/// (`{dir}/{spec.file_name}`). Used for fixtures and pre-downloaded data.
pub struct FileFetcher {
    dir: PathBuf,
}

impl FileFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Fetcher for FileFetcher {
    fn name(&self) -> &str {
        "local_file"
    }

    fn fetch(&self, spec: &SourceSpec) -> Result<RawDocument, FetchError> {
        let path = self.dir.join(&spec.file_name);
        debug!(indicator = %spec.indicator, path = %path.display(), "reading local file");
        let text = std::fs::read_to_string(&path).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(RawDocument::new(
            spec.indicator,
            path.display().to_string(),
            DataSource::LocalFile,
            text,
        ))
    }
}
