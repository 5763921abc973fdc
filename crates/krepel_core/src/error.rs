//! # Core Error Types
//!
//! Recoverable failures reported by the loop registry. Ownership misuse is
//! never reported here: it panics.

use thiserror::Error;

/// Errors returned by [`LoopRegistry`](crate::LoopRegistry) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    /// No entry is registered under this name.
    #[error("no loop callback named `{0}` is registered")]
    NotFound(String),

    /// An entry with this name already exists.
    #[error("a loop callback named `{0}` is already registered")]
    AlreadyExists(String),
}

/// Result type for loop registry operations.
pub type LoopResult<T> = Result<T, LoopError>;
