//! Diagnostic sink - optional receiver for registry warnings
//!
//! Registries never log through a global facility on their own behalf. A
//! sink is injected at construction; without one, diagnostics are dropped.

use std::error::Error as StdError;
use tracing::{error, warn};

/// Receiver for registry diagnostics
pub trait DiagnosticSink: Send + Sync {
    /// A benign condition worth reporting (e.g. duplicate registration)
    fn warn(&self, registry: &str, message: &str);

    /// A listener failed during dispatch
    fn error(&self, registry: &str, message: &str, cause: &(dyn StdError + 'static));
}

/// Sink that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, registry: &str, message: &str) {
        warn!(registry, "{}", message);
    }

    fn error(&self, registry: &str, message: &str, cause: &(dyn StdError + 'static)) {
        error!(registry, error = %cause, "{}", message);
    }
}
