//! Error types for Relay
//!
//! Misuse of the registry (duplicate add, removing an unknown listener) is
//! never an error. Only resource exhaustion and configuration problems
//! surface here.

use std::collections::TryReserveError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Relay error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Registry
    // ========================================================================
    #[error("Allocation failed while building listener snapshot: {0}")]
    Allocation(#[from] TryReserveError),

    // ========================================================================
    // Config
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the registry could not complete a mutation.
    ///
    /// The previously published snapshot is still in place when this is true.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Allocation(_))
    }

    /// Configuration error helper
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}
