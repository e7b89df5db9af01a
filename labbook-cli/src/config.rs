//! Configuration loading for the LABBOOK CLI.
//!
//! The file is optional. Every field falls back to the estimator defaults
//! (after the `LABBOOK_*` environment overlay), so an empty file is valid.

use labbook_core::{EstimatorConfig, TestTypeMultipliers};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "LABBOOK_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CliConfig {
    pub estimator: EstimatorSection,
    pub report: ReportSection,
}

/// Overrides for [`EstimatorConfig`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EstimatorSection {
    pub z_alpha: Option<f64>,
    pub z_beta: Option<f64>,
    pub significance_threshold: Option<f64>,
    pub multipliers: Option<MultiplierSection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultiplierSection {
    pub traditional: f64,
    pub nontraditional: f64,
    pub multivariate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReportSection {
    /// Directory report files are written into.
    pub output_dir: PathBuf,
    /// Insights listed in the knowledge hub report.
    pub max_insights: usize,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            max_insights: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Estimator(#[from] labbook_core::LabbookError),
}

impl CliConfig {
    /// Load from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "report.output_dir",
                reason: "must not be empty".to_string(),
            });
        }
        if self.report.max_insights == 0 {
            return Err(ConfigError::InvalidValue {
                field: "report.max_insights",
                reason: "must be > 0".to_string(),
            });
        }
        self.estimator_config().validate()?;
        Ok(())
    }

    /// Estimator settings: defaults, then environment, then this file.
    pub fn estimator_config(&self) -> EstimatorConfig {
        let base = EstimatorConfig::from_env();
        let section = &self.estimator;
        EstimatorConfig {
            z_alpha: section.z_alpha.unwrap_or(base.z_alpha),
            z_beta: section.z_beta.unwrap_or(base.z_beta),
            significance_threshold: section
                .significance_threshold
                .unwrap_or(base.significance_threshold),
            multipliers: section
                .multipliers
                .as_ref()
                .map(|m| TestTypeMultipliers {
                    traditional: m.traditional,
                    nontraditional: m.nontraditional,
                    multivariate: m.multivariate,
                })
                .unwrap_or(base.multipliers),
        }
    }
}
