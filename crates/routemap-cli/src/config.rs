//! Command-line configuration.
//!
//! Buffer options can also be provided through environment variables:
//! - `ROUTEMAP_INITIAL_SEGMENT_SIZE`
//! - `ROUTEMAP_MIN_SEGMENT_SIZE`
//! - `ROUTEMAP_BUFFER_MODE` (`scoped` or `shared`)
//!
//! # Example
//!
//! ```no_run
//! use routemap_cli::CliConfig;
//!
//! let config = CliConfig::from_args();
//! config.validate().expect("Invalid configuration");
//! println!("buffer mode: {:?}", config.buffer_mode);
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use routemap_buffer::{
    BufferConfig, BufferMode, DEFAULT_INITIAL_SEGMENT_SIZE, DEFAULT_MIN_SEGMENT_SIZE,
};
use routemap_formats::EncoderConfig;

use crate::error::ConfigError;

/// Upper bound accepted for either segment size option
pub const MAX_SEGMENT_SIZE: usize = 64 * 1024 * 1024;

/// Tool configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "routemap",
    about = "Encode, inspect and query route map files",
    version
)]
pub struct CliConfig {
    /// Length of the first buffer segment
    #[arg(
        long,
        global = true,
        env = "ROUTEMAP_INITIAL_SEGMENT_SIZE",
        default_value_t = DEFAULT_INITIAL_SEGMENT_SIZE
    )]
    pub initial_segment_size: usize,

    /// Minimum length of segments rented on overflow
    #[arg(
        long,
        global = true,
        env = "ROUTEMAP_MIN_SEGMENT_SIZE",
        default_value_t = DEFAULT_MIN_SEGMENT_SIZE
    )]
    pub min_segment_size: usize,

    /// Buffer lifetime mode (scoped or shared)
    #[arg(long, global = true, env = "ROUTEMAP_BUFFER_MODE", default_value = "scoped")]
    pub buffer_mode: BufferMode,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Tool subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Encode a JSON object into a route map file
    Encode {
        /// JSON file holding one object of key/value pairs
        input: PathBuf,
        /// Output route map file
        output: PathBuf,
    },
    /// Look up one key
    Get {
        /// Route map file
        file: PathBuf,
        /// Key to look up
        key: String,
        /// Interpret the key as hex-encoded bytes
        #[arg(long)]
        hex: bool,
    },
    /// Print every key and value
    Dump {
        /// Route map file
        file: PathBuf,
        /// Print a JSON object instead of one line per key
        #[arg(long)]
        json: bool,
    },
    /// Print the header fields
    Info {
        /// Route map file
        file: PathBuf,
    },
}

impl CliConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Buffer sizing taken from the options
    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig {
            initial_segment_size: self.initial_segment_size,
            min_segment_size: self.min_segment_size,
        }
    }

    /// Encoder configuration taken from the options
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            buffer: self.buffer_config(),
            mode: self.buffer_mode,
        }
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Either segment size is zero or larger than [`MAX_SEGMENT_SIZE`]
    /// - The input file of `encode` does not exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("initial segment size", self.initial_segment_size),
            ("minimum segment size", self.min_segment_size),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidSegmentSize {
                    name,
                    value,
                    reason: "must be positive",
                });
            }
            if value > MAX_SEGMENT_SIZE {
                return Err(ConfigError::InvalidSegmentSize {
                    name,
                    value,
                    reason: "exceeds 64 MiB",
                });
            }
        }

        if let Command::Encode { input, .. } = &self.command {
            if !input.exists() {
                return Err(ConfigError::MissingInput(input.clone()));
            }
        }

        Ok(())
    }
}
