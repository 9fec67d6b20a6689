//! Pipeline configuration loaded from TOML.
//!
//! Every section is optional; an empty file yields the built-in defaults,
//! which point at the three published datasets.
//!
//! ```toml
//! [sources.co2]
//! region = "World"
//!
//! [fetch]
//! timeout_secs = 30
//! max_retries = 2
//!
//! [merge]
//! policy = "inclusive"
//! # min_periods = 1  # unset: a year needs all 12 months
//!
//! [analysis]
//! rolling_window = 5
//!
//! [output]
//! dir = "output"
//! cache_dir = "data/raw"
//! ```

use climatelab_core::align::AlignOptions;
use climatelab_core::analysis::AnalysisOptions;
use climatelab_core::data::{HttpSettings, SourceSpec, MAX_BACKOFF};
use climatelab_core::domain::Indicator;
use climatelab_core::parse::{epa, owid, ParserSettings, TemperatureResolution};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on `fetch.max_retries`.
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureSource {
    pub url: String,
    pub file_name: String,
    pub resolution: TemperatureResolution,
}

impl Default for TemperatureSource {
    fn default() -> Self {
        let spec = SourceSpec::default_for(Indicator::TemperatureAnomaly);
        Self {
            url: spec.url,
            file_name: spec.file_name,
            resolution: TemperatureResolution::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Co2Source {
    pub url: String,
    pub file_name: String,
    /// OWID `country` value to keep.
    pub region: String,
}

impl Default for Co2Source {
    fn default() -> Self {
        let spec = SourceSpec::default_for(Indicator::Co2Emissions);
        Self {
            url: spec.url,
            file_name: spec.file_name,
            region: owid::DEFAULT_REGION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeaLevelSource {
    pub url: String,
    pub file_name: String,
    pub column: String,
}

impl Default for SeaLevelSource {
    fn default() -> Self {
        let spec = SourceSpec::default_for(Indicator::SeaLevel);
        Self {
            url: spec.url,
            file_name: spec.file_name,
            column: epa::DEFAULT_COLUMN.to_string(),
        }
    }
}

/// The `[sources.*]` tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub temperature: TemperatureSource,
    pub co2: Co2Source,
    pub sea_level: SeaLevelSource,
}

impl SourcesConfig {
    pub fn spec(&self, indicator: Indicator) -> SourceSpec {
        match indicator {
            Indicator::TemperatureAnomaly => SourceSpec::new(
                indicator,
                &self.temperature.url,
                &self.temperature.file_name,
            ),
            Indicator::Co2Emissions => {
                SourceSpec::new(indicator, &self.co2.url, &self.co2.file_name)
            }
            Indicator::SeaLevel => {
                SourceSpec::new(indicator, &self.sea_level.url, &self.sea_level.file_name)
            }
        }
    }

    pub fn parser_settings(&self) -> ParserSettings {
        ParserSettings {
            temperature_resolution: self.temperature.resolution,
            co2_region: self.co2.region.clone(),
            sea_level_column: self.sea_level.column.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Parent directory for per-run artifact directories.
    pub dir: PathBuf,
    /// Raw download cache.
    pub cache_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            cache_dir: PathBuf::from("data/raw"),
        }
    }
}

/// Everything a run needs, resolved once before the first stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: SourcesConfig,
    pub fetch: HttpSettings,
    pub merge: AlignOptions,
    pub analysis: AnalysisOptions,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        if self.fetch.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid {
                field: "fetch.max_retries",
                reason: format!("{} exceeds the limit of {MAX_RETRIES}", self.fetch.max_retries),
            });
        }
        if u128::from(self.fetch.backoff_ms) > MAX_BACKOFF.as_millis() {
            return Err(ConfigError::Invalid {
                field: "fetch.backoff_ms",
                reason: format!(
                    "{} exceeds the limit of {}",
                    self.fetch.backoff_ms,
                    MAX_BACKOFF.as_millis()
                ),
            });
        }
        if self.merge.min_periods == Some(0) {
            return Err(ConfigError::Invalid {
                field: "merge.min_periods",
                reason: "must be at least 1".into(),
            });
        }
        if self.analysis.rolling_window == 0 {
            return Err(ConfigError::Invalid {
                field: "analysis.rolling_window",
                reason: "must be at least 1".into(),
            });
        }
        for indicator in Indicator::ALL {
            let spec = self.sources.spec(indicator);
            if spec.file_name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "sources.file_name",
                    reason: format!("{indicator} has an empty file name"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use climatelab_core::domain::MergePolicy;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.merge.policy, MergePolicy::Strict);
        assert_eq!(config.analysis.rolling_window, 5);
        assert_eq!(
            config.sources.spec(Indicator::Co2Emissions),
            SourceSpec::default_for(Indicator::Co2Emissions)
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            [merge]
            policy = "forward-fill"

            [sources.co2]
            region = "Europe"

            [sources.temperature]
            resolution = "annual"
            "#,
        )
        .unwrap();
        assert_eq!(config.merge.policy, MergePolicy::ForwardFill);
        assert_eq!(config.merge.min_periods, None);

        let settings = config.sources.parser_settings();
        assert_eq!(settings.co2_region, "Europe");
        assert_eq!(settings.temperature_resolution, TemperatureResolution::Annual);
        assert_eq!(settings.sea_level_column, epa::DEFAULT_COLUMN);
        assert_eq!(config.sources.co2.file_name, "co2_data.csv");
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let err = PipelineConfig::from_toml("[merge]\npolicy = \"outer\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            ("[fetch]\ntimeout_secs = 0\n", "fetch.timeout_secs"),
            ("[fetch]\nmax_retries = 11\n", "fetch.max_retries"),
            ("[fetch]\nbackoff_ms = 3600000\n", "fetch.backoff_ms"),
            ("[merge]\nmin_periods = 0\n", "merge.min_periods"),
            ("[analysis]\nrolling_window = 0\n", "analysis.rolling_window"),
            ("[sources.sea_level]\nfile_name = \" \"\n", "sources.file_name"),
        ];
        for (toml, expected) in cases {
            match PipelineConfig::from_toml(toml) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("{toml:?}: expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn config_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("climatelab.toml");
        let mut config = PipelineConfig::default();
        config.merge.policy = MergePolicy::Inclusive;
        config.merge.min_periods = Some(3);
        config.output.dir = PathBuf::from("artifacts");
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(PipelineConfig::from_file(&path).unwrap(), config);
    }
}
