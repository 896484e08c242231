//! Logging setup
//!
//! Library code only emits `tracing` events; binaries call [`init`] once to
//! install a formatting subscriber. `RUST_LOG` takes precedence over the
//! configured level.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Build the filter: `RUST_LOG` if set, else `level`
pub fn filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| Error::Config(format!("Invalid log level {:?}: {}", level, e))),
    }
}

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays clean. Calling it twice is an error.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { config.level.as_str() };

    fmt()
        .with_env_filter(filter(level)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))
}
