// src/errors.rs

//! Crate-wide error type.
//!
//! Task-level failures (`Start`, `RuntimeExit`, `Timeout`, `Cancelled`) are
//! turned into a [`TaskResult`](crate::types::TaskResult) by the supervisor and
//! never escape `execute`. The remaining variants describe problems of the
//! shim itself and propagate to `main`.

use std::time::Duration;

use thiserror::Error;

use crate::types::CancelReason;

#[derive(Error, Debug)]
pub enum ShimError {
    #[error("failed to start '{binary}': {source}")]
    Start {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{binary}' exited with code {code}")]
    RuntimeExit { binary: String, code: i32 },

    #[error("{binary} timed out after {timeout:?}")]
    Timeout { binary: String, timeout: Duration },

    #[error("cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("interruption tracker: {0}")]
    WatcherTransient(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("task source '{0}' is not supported by this build")]
    UnsupportedSource(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ShimError {
    fn from(e: reqwest::Error) -> Self {
        ShimError::WatcherTransient(e.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ShimError>;
