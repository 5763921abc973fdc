//! # Engine Error Types

use std::path::PathBuf;

use krepel_core::LoopError;
use thiserror::Error;

/// Errors raised while loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by [`Engine`](crate::Engine).
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Loop registration failed.
    #[error(transparent)]
    Loop(#[from] LoopError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
