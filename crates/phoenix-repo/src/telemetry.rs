//! Logging setup.

use tracing::Level;

use crate::config::LoggingConfig;
use crate::error::{RepoError, RepoResult};

/// Parse the configured level.
pub fn level(config: &LoggingConfig) -> RepoResult<Level> {
    config
        .level
        .parse::<Level>()
        .map_err(|_| RepoError::Config(format!("unknown log level: {}", config.level)))
}

/// Install the global `tracing` subscriber.
///
/// Returns `Ok(false)` if a subscriber was already installed.
pub fn init(config: &LoggingConfig) -> RepoResult<bool> {
    let level = level(config)?;
    Ok(tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok())
}
