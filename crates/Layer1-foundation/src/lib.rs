//! # relay-foundation
//!
//! Foundation layer for Relay:
//! - Listener: snapshot-consistent listener registry, identity handles,
//!   diagnostic sink, dispatch
//! - Config: registry and dispatch settings (JSON)
//! - Error: crate error type
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Event producers (link, protocol, UI ...)               │
//! │                     │ notify / fire                     │
//! │                     ▼                                   │
//! │          ObserverRegistry<T>  ◄── add / remove          │
//! │          │ published snapshot                           │
//! │          ▼                                              │
//! │   Listener 1 ... Listener N      DiagnosticSink         │
//! │                                  (TracingSink)          │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod listener;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{DispatchConfig, RegistryConfig, RelayConfig, RELAY_CONFIG_FILE};

// ============================================================================
// Listener
// ============================================================================
pub use listener::{
    // Registry
    ObserverRegistry,
    Iter,
    Snapshot,
    // Handles
    ListenerRef,
    SharedListener,
    // Diagnostics
    DiagnosticSink,
    TracingSink,
    // Dispatch
    DispatchReport,
    EventListener,
    ListenerError,
};
