//! Command-line tool for route map files
//!
//! The `routemap` binary encodes a JSON object into a route map, looks up
//! single keys, dumps every pair and prints header information. This
//! library holds the configuration and command implementations so they
//! can be tested without spawning the binary.

#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{display_key, dump_file, encode_file, file_info, get_value, parse_key, run};
pub use config::{CliConfig, Command};
pub use error::{CliError, CliResult, ConfigError};
