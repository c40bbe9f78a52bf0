// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only configuration problems are typed here. Errors returned by a
//! triggered callback are plain [`anyhow::Error`]s that get logged and
//! dropped inside the trigger loop; they never reach a caller.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::SignalId;

#[derive(Error, Debug)]
pub enum TriplineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration error: using both 'at' and 'after' leads to an ambiguous start")]
    AmbiguousStart,

    #[error("Configuration error: using both 'until' and 'for' leads to an ambiguous stop")]
    AmbiguousStop,

    #[error("Configuration error: 'every' is required when using 'until' or 'for'")]
    MissingInterval,

    #[error("Configuration error: 'every' must be greater than zero")]
    ZeroInterval,

    #[error("Configuration error: cannot create output file {path:?}: {source}")]
    OutputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: cannot listen for signal {signal}: {source}")]
    SignalRegistration {
        signal: SignalId,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid action '{action}': {source}")]
    InvalidAction {
        action: String,
        #[source]
        source: Box<TriplineError>,
    },

    #[error("actions must be started from within a Tokio runtime")]
    NoRuntime,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl TriplineError {
    /// True for errors that come from how an action was configured, as
    /// opposed to the environment it runs in.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TriplineError::ConfigError(_)
                | TriplineError::AmbiguousStart
                | TriplineError::AmbiguousStop
                | TriplineError::MissingInterval
                | TriplineError::ZeroInterval
                | TriplineError::OutputFile { .. }
                | TriplineError::SignalRegistration { .. }
                | TriplineError::InvalidAction { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TriplineError>;
