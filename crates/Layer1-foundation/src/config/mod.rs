//! Config - registry and dispatch settings
//!
//! - `relay.rs` - RelayConfig (registry + dispatch)

mod relay;

pub use relay::{DispatchConfig, RegistryConfig, RelayConfig, RELAY_CONFIG_FILE};
