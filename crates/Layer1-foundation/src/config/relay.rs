//! Relay Config - registry and dispatch settings
//!
//! Stored as a JSON file. Every field is optional on disk and falls back to
//! its `default_*` value.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name
pub const RELAY_CONFIG_FILE: &str = "relay.json";

// ============================================================================
// Relay Config
// ============================================================================

/// Combined configuration for a listener registry and its dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Dispatch settings
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config that never reports duplicate registrations
    pub fn quiet() -> Self {
        Self {
            registry: RegistryConfig {
                warn_on_duplicate: false,
                ..Default::default()
            },
            dispatch: DispatchConfig::default(),
        }
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// Parse a config from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::config(format!("Failed to parse: {}", e)))
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load a config file, `None` if it does not exist
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Load a config file or fall back to defaults when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::load_optional(path)?.unwrap_or_default())
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::config(format!("Failed to create directory: {}", e))
                })?;
            }
        }
        let content = self.to_json_string()?;
        std::fs::write(path, content)
            .map_err(|e| Error::config(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Serialize as pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize: {}", e)))
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.registry.label = label.into();
        self
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.registry.initial_capacity = capacity;
        self
    }

    pub fn evict_on_error(mut self, evict: bool) -> Self {
        self.dispatch.evict_on_error = evict;
        self
    }
}

// ============================================================================
// Registry Config
// ============================================================================

/// Settings for an [`ObserverRegistry`](crate::listener::ObserverRegistry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Name attached to every diagnostic and log line
    #[serde(default = "default_label")]
    pub label: String,

    /// Capacity reserved for the member list up front
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Report duplicate registrations to the diagnostic sink
    #[serde(default = "default_true")]
    pub warn_on_duplicate: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            initial_capacity: default_initial_capacity(),
            warn_on_duplicate: true,
        }
    }
}

// ============================================================================
// Dispatch Config
// ============================================================================

/// Settings for [`ObserverRegistry::fire`](crate::listener::ObserverRegistry::fire)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    /// Remove a listener from the registry when delivery to it fails
    #[serde(default = "default_true")]
    pub evict_on_error: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            evict_on_error: true,
        }
    }
}

// Default value functions
fn default_label() -> String {
    "listeners".to_string()
}
fn default_initial_capacity() -> usize {
    8
}
fn default_true() -> bool {
    true
}
