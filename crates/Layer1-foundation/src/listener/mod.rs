//! Listener System - snapshot-consistent listener registry
//!
//! Keeps the set of listeners interested in events produced elsewhere.
//! Dispatch reads a published snapshot and never waits on registration.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ObserverRegistry<T>                       │
//! │  add / remove / remove_all ──► Mutex<Vec<T>>                 │
//! │                                    │ rebuild                 │
//! │                                    ▼                         │
//! │                  published ArcSwap<Vec<T>> ──► snapshot()    │
//! │                                    │              iter()     │
//! │                                    ▼              fire()     │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐        │
//! │  │  Listener 1  │  │  Listener 2  │  │  Listener N  │        │
//! │  └──────────────┘  └──────────────┘  └──────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use relay_foundation::listener::{
//!     EventListener, ListenerError, ObserverRegistry, SharedListener, TracingSink,
//! };
//!
//! struct Printer;
//!
//! impl EventListener<String> for Printer {
//!     fn on_event(&self, event: &String) -> Result<(), ListenerError> {
//!         println!("{}", event);
//!         Ok(())
//!     }
//! }
//!
//! let registry = ObserverRegistry::with_sink(Arc::new(TracingSink));
//! let printer = SharedListener::listener(Printer);
//! registry.add(printer.clone())?;
//!
//! registry.notify(&"link up".to_string())?;
//! registry.remove(&printer)?;
//! ```

pub mod dispatch;
pub mod handle;
pub mod registry;
pub mod sink;
pub mod snapshot;

pub use dispatch::{DispatchReport, EventListener, ListenerError, SharedListener};
pub use handle::ListenerRef;
pub use registry::ObserverRegistry;
pub use sink::{DiagnosticSink, TracingSink};
pub use snapshot::{Iter, Snapshot};
