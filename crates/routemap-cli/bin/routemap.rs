//! Routemap tool binary entry point.
//!
//! A thin wrapper around the routemap-cli library that:
//! 1. Initializes logging
//! 2. Parses and validates configuration
//! 3. Runs the selected command
//!
//! For library usage, see the routemap-cli crate documentation.

use anyhow::Result;
use routemap_cli::{CliConfig, run};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::from_args();
    tracing::debug!(
        "Configuration loaded: mode={:?}, initial={}, min={}",
        config.buffer_mode,
        config.initial_segment_size,
        config.min_segment_size
    );

    config.validate()?;

    let mut stdout = std::io::stdout().lock();
    run(&config, &mut stdout).await?;

    Ok(())
}
