use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "metaexport.yaml";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RecorderConfig {
    /// Path of the JSON report. Required only when a report is emitted.
    pub output: Option<PathBuf>,

    /// Emit even when every collected test succeeded.
    /// Default: false (successful runs produce no report).
    pub always_emit: bool,

    /// Indent the report (2 spaces). Default: true.
    pub pretty: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output: None,
            always_emit: false,
            pretty: true,
        }
    }
}

impl RecorderConfig {
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_always_emit(mut self, always_emit: bool) -> Self {
        self.always_emit = always_emit;
        self
    }
}

pub fn load_config(path: &Path) -> Result<RecorderConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    // An empty file is a valid, all-defaults config.
    if raw.trim().is_empty() {
        return Ok(RecorderConfig::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
