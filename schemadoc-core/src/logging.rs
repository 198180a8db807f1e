//! Logging setup for the schemadoc binary.

use crate::Result;
use crate::error::SchemaDocError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Maps the CLI verbosity flags onto a tracing level.
///
/// `quiet` wins over any `-v` count.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Installs the stderr subscriber for the whole process.
///
/// The `-v`/`-q` level is the default; `RUST_LOG` directives, if set, are
/// layered on top (e.g. `RUST_LOG=sqlx=warn`). Fails if a subscriber is
/// already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level_for(verbose, quiet)).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| SchemaDocError::configuration(format!("Logging already initialized: {}", e)))
}
