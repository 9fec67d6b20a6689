//! Raw download cache.
//!
//! Layout: `{cache_dir}/{file_name}` plus `{cache_dir}/{indicator}.meta.json`
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Integrity check on load (BLAKE3 hash against the sidecar)
//! - Quarantine for files whose hash no longer matches ({file}.quarantined)
//!
//! The cache is a convenience: a run never depends on it being present.

use super::provider::{DataSource, FetchError, RawDocument, SourceSpec};
use crate::domain::Indicator;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Metadata sidecar for a cached document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub indicator: Indicator,
    /// URL the entry was fetched for; a source pointed elsewhere misses.
    pub url: String,
    /// Where the text actually came from (URL or local path).
    pub origin: String,
    pub file_name: String,
    pub bytes: usize,
    pub data_hash: String,
    pub fetched_at: NaiveDateTime,
}

/// Cache status for a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub indicator: Indicator,
    pub cached: bool,
    pub meta: Option<CacheMeta>,
}

pub struct RawCache {
    cache_dir: PathBuf,
}

impl RawCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn data_path(&self, spec: &SourceSpec) -> PathBuf {
        self.cache_dir.join(&spec.file_name)
    }

    fn meta_path(&self, indicator: Indicator) -> PathBuf {
        self.cache_dir.join(format!("{indicator}.meta.json"))
    }

    /// Store a fetched document and its sidecar.
    pub fn write(&self, spec: &SourceSpec, doc: &RawDocument) -> Result<CacheMeta, FetchError> {
        fs::create_dir_all(&self.cache_dir).map_err(|source| FetchError::Io {
            path: self.cache_dir.clone(),
            source,
        })?;

        let path = self.data_path(spec);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, &doc.text).map_err(|source| FetchError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            FetchError::Cache(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            indicator: spec.indicator,
            url: spec.url.clone(),
            origin: doc.origin.clone(),
            file_name: spec.file_name.clone(),
            bytes: doc.text.len(),
            data_hash: doc.content_hash(),
            fetched_at: doc.fetched_at,
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| FetchError::Cache(format!("meta serialization: {e}")))?;
        let meta_path = self.meta_path(spec.indicator);
        fs::write(&meta_path, meta_json).map_err(|source| FetchError::Io {
            path: meta_path,
            source,
        })?;

        debug!(indicator = %spec.indicator, path = %path.display(), "cached raw document");
        Ok(meta)
    }

    /// Load a cached document, verifying it against its sidecar hash.
    ///
    /// A missing file or sidecar is [`FetchError::NotCached`], and so is an
    /// entry written for another URL or file name than `spec` names. A file whose hash does not match is quarantined and
    /// also reported as not cached.
    pub fn load(&self, spec: &SourceSpec) -> Result<RawDocument, FetchError> {
        let not_cached = || FetchError::NotCached {
            indicator: spec.indicator,
        };
        let meta = self.get_meta(spec.indicator).ok_or_else(not_cached)?;
        if meta.url != spec.url || meta.file_name != spec.file_name {
            debug!(
                indicator = %spec.indicator,
                cached = %meta.url,
                wanted = %spec.url,
                "cached copy is for a different source"
            );
            return Err(not_cached());
        }
        let path = self.data_path(spec);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_cached()),
            Err(source) => return Err(FetchError::Io { path, source }),
        };

        let hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        if hash != meta.data_hash {
            let quarantine = path.with_extension("quarantined");
            warn!(
                indicator = %spec.indicator,
                path = %path.display(),
                "cached file does not match its recorded hash; quarantining"
            );
            let _ = fs::rename(&path, &quarantine);
            return Err(not_cached());
        }

        Ok(RawDocument {
            indicator: spec.indicator,
            origin: meta.origin,
            source: DataSource::Cache,
            text,
            fetched_at: meta.fetched_at,
        })
    }

    pub fn get_meta(&self, indicator: Indicator) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(indicator)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Which sources have cached documents.
    pub fn status(&self, indicators: &[Indicator]) -> Vec<CacheStatus> {
        indicators
            .iter()
            .map(|&indicator| {
                let meta = self.get_meta(indicator);
                CacheStatus {
                    indicator,
                    cached: meta.is_some(),
                    meta,
                }
            })
            .collect()
    }
}
