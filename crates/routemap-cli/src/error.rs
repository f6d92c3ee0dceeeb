//! Error types for the routemap tool.

use std::path::PathBuf;
use thiserror::Error;

use routemap_formats::MapError;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Segment size outside the accepted range
    #[error("Invalid {name} {value}: {reason}")]
    InvalidSegmentSize {
        /// Option name
        name: &'static str,
        /// Rejected value
        value: usize,
        /// Reason for invalidity
        reason: &'static str,
    },

    /// Input file does not exist
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),
}

/// Command errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to read or write a file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Input is not a JSON object of values
    #[error("Invalid JSON input: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Key argument could not be decoded
    #[error("Invalid key '{0}': {1}")]
    InvalidKey(String, String),

    /// Route map encoding or decoding failed
    #[error("Route map error: {0}")]
    Map(#[from] MapError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for tool commands
pub type CliResult<T> = Result<T, CliError>;
