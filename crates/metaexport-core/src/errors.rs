//! Error types for the recorder and its configuration.

use std::path::PathBuf;

/// Exit code for configuration and write failures surfaced to the host.
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Recorder errors. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// Emission was required but no output path is configured.
    #[error("configuration error: no output path configured (set --metaexport-json)")]
    MissingOutputPath,

    /// The report could not be written to the configured path.
    #[error("configuration error: cannot write report to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The summary could not be serialized.
    #[error("failed to serialize run summary: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Reading a test's declared metadata failed during collection.
    #[error("declared metadata for {nodeid} is invalid: {source}")]
    Metadata {
        nodeid: String,
        #[source]
        source: MetadataError,
    },

    /// Session finish was reached without a session start.
    #[error("session finished before it was started")]
    SessionNotStarted,
}

impl RecorderError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        EXIT_CONFIG_ERROR
    }

    /// True for errors in the configuration channel (missing or unwritable output).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingOutputPath | Self::Write { .. })
    }
}

/// Failure raised by a [`crate::DeclaresMetadata`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The attached metadata is not a string-keyed mapping.
    #[error("expected a mapping of string keys, got {found}")]
    NotAMapping { found: &'static str },

    /// Any other failure reported by the metadata source.
    #[error("{0}")]
    Source(String),
}

/// Errors loading a YAML config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
