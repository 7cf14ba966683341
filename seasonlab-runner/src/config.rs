//! Serializable runner configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runner configuration.
///
/// Every field has a default, so an empty TOML file is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Root directory for the JSON store.
    pub data_dir: PathBuf,
    /// Upsert chunk size: each chunk is applied as one all-or-nothing write.
    pub chunk_size: usize,
    /// Row errors beyond this bound fail the whole batch.
    pub row_error_limit: usize,
    /// Incremental recompute lookback. Widen for series with multi-year
    /// trading gaps.
    pub lookback_months: u32,
    /// Run symbols within a batch in parallel.
    pub parallel: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            chunk_size: 500,
            row_error_limit: seasonlab_core::ingest::DEFAULT_ROW_ERROR_LIMIT,
            lookback_months: seasonlab_core::planner::DEFAULT_LOOKBACK_MONTHS,
            parallel: true,
        }
    }
}

impl RunnerConfig {
    /// Load from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}
