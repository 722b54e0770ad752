//! logging
//!
//! Log verbosity and subscriber setup.
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them call [`init`] once at startup.
//!
//! # Filtering
//!
//! `IPMKIT_LOG` takes an `EnvFilter` directive string and overrides the
//! verbosity passed to [`init`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an explicit filter directive.
pub const LOG_ENV: &str = "IPMKIT_LOG";

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Quiet mode - warnings and errors only
    Quiet,
    /// Normal mode - informational events
    #[default]
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// The filter directive used when `IPMKIT_LOG` is not set.
    pub fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Debug => "info,ipmkit=debug",
        }
    }
}

/// Install a global fmt subscriber writing to stderr.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if a global subscriber exists.
pub fn init(verbosity: Verbosity) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(?verbosity, "logging initialized");
    Ok(())
}
