//! ObserverRegistry - copy-on-write listener container
//!
//! Iterating listeners is the predominant operation; adding and removing
//! them is rare. Writers serialize on a mutex, rebuild the full snapshot and
//! publish it with one atomic pointer swap. Readers load the published `Arc`
//! from an `ArcSwap` and never take a lock.
//!
//! ```text
//!   add / remove / remove_all            snapshot / iter / len / contains
//!   ───────────────────────────          ────────────────────────────────
//!   lock members (Mutex)                 load snapshot ptr (ArcSwap)
//!   check / rebuild Arc<Vec<T>>          walk without any lock
//!   swap snapshot ptr (ArcSwap)
//!   unlock
//!   drop displaced snapshot
//! ```

use super::sink::DiagnosticSink;
use super::snapshot::{Iter, Snapshot};
use crate::config::RelayConfig;
use crate::Result;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Thread-safe set of listeners with shared read-only snapshots
///
/// ## Invariants
///
/// 1. The published snapshot equals the member list as of the last
///    completed mutation.
/// 2. The member list holds no two equal listeners.
/// 3. A published snapshot is never changed; every mutation publishes a new
///    one, so snapshots already handed out stay valid.
///
/// ## Usage
///
/// ```ignore
/// use relay_foundation::listener::ObserverRegistry;
///
/// let registry = ObserverRegistry::new();
/// registry.add("a")?;
/// registry.add("b")?;
///
/// let before = registry.snapshot();
/// registry.remove(&"a")?;
///
/// assert_eq!(before, ["a", "b"]);
/// assert_eq!(registry.snapshot(), ["b"]);
/// ```
pub struct ObserverRegistry<T> {
    /// Member list, only touched under the lock
    members: Mutex<Vec<T>>,

    /// Published snapshot
    snapshot: ArcSwap<Vec<T>>,

    /// Settings
    config: RelayConfig,

    /// Optional receiver for diagnostics
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl<T: PartialEq + Clone> ObserverRegistry<T> {
    /// Empty registry with default settings and no sink
    pub fn new() -> Self {
        Self::from_config(RelayConfig::default(), None)
    }

    /// Empty registry reporting to `sink`
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::from_config(RelayConfig::default(), Some(sink))
    }

    /// Empty registry with custom settings and no sink
    pub fn with_config(config: RelayConfig) -> Self {
        Self::from_config(config, None)
    }

    pub fn from_config(config: RelayConfig, sink: Option<Arc<dyn DiagnosticSink>>) -> Self {
        Self {
            members: Mutex::new(Vec::with_capacity(config.registry.initial_capacity)),
            snapshot: ArcSwap::from_pointee(Vec::new()),
            config,
            sink,
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Register a listener
    ///
    /// `None` and already registered listeners are ignored. A duplicate is
    /// reported to the sink as a warning. Returns whether the listener was
    /// inserted.
    pub fn add(&self, listener: impl Into<Option<T>>) -> Result<bool> {
        let Some(listener) = listener.into() else {
            return Ok(false);
        };

        let mut members = self.members.lock();
        if members.contains(&listener) {
            drop(members);
            if self.config.registry.warn_on_duplicate {
                self.report_warning("event listener already registered");
            }
            return Ok(false);
        }

        // Build before touching `members` so a failed allocation changes nothing.
        members.try_reserve(1)?;
        let next = rebuild(
            members.iter().chain(std::iter::once(&listener)),
            members.len() + 1,
        )?;
        members.push(listener);
        let previous = self.publish(next);

        debug!(registry = %self.label(), listeners = members.len(), "Registered event listener");
        drop(members);
        drop(previous);
        Ok(true)
    }

    /// Unregister a listener
    ///
    /// Removing a listener that was never added does nothing. Returns
    /// whether a listener was removed.
    pub fn remove(&self, listener: &T) -> Result<bool> {
        let mut members = self.members.lock();
        let Some(index) = members.iter().position(|m| m == listener) else {
            return Ok(false);
        };

        let next = rebuild(
            members
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, m)| m),
            members.len() - 1,
        )?;
        let removed = members.remove(index);
        let previous = self.publish(next);

        debug!(registry = %self.label(), listeners = members.len(), "Unregistered event listener");
        drop(members);
        drop(previous);
        drop(removed);
        Ok(true)
    }

    /// Unregister every listener and publish an empty snapshot
    pub fn remove_all(&self) -> Result<()> {
        let mut members = self.members.lock();
        let next = rebuild::<T>(std::iter::empty(), 0)?;
        let removed = std::mem::take(&mut *members);
        let previous = self.publish(next);

        debug!(registry = %self.label(), removed = removed.len(), "Cleared event listeners");
        drop(members);
        drop(previous);
        drop(removed);
        Ok(())
    }

    // ========================================================================
    // Read
    // ========================================================================

    /// The currently published snapshot
    ///
    /// No elements are copied; repeated calls between two mutations return
    /// the same instance. Never blocks, even while a writer is publishing.
    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot::from_arc(self.snapshot.load_full())
    }

    /// Traversal over the snapshot current at the time of the call
    pub fn iter(&self) -> Iter<T> {
        self.snapshot().into_iter_owned()
    }

    /// Number of listeners in the published snapshot
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the published snapshot holds `listener`
    pub fn contains(&self, listener: &T) -> bool {
        self.snapshot.load_full().contains(listener)
    }
}

impl<T> ObserverRegistry<T> {
    /// Registry label used in diagnostics
    pub fn label(&self) -> &str {
        &self.config.registry.label
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub(crate) fn report_warning(&self, message: &str) {
        if let Some(sink) = &self.sink {
            sink.warn(self.label(), message);
        }
    }

    pub(crate) fn report_error(&self, message: &str, cause: &(dyn StdError + 'static)) {
        if let Some(sink) = &self.sink {
            sink.error(self.label(), message, cause);
        }
    }

    /// Swap in a new snapshot. Caller holds the members lock.
    ///
    /// Returns the displaced snapshot so the caller can drop it after
    /// releasing the lock.
    #[must_use]
    fn publish(&self, next: Arc<Vec<T>>) -> Arc<Vec<T>> {
        let len = next.len();
        let previous = self.snapshot.swap(next);
        trace!(registry = %self.label(), listeners = len, "Published listener snapshot");
        previous
    }
}

impl<T: PartialEq + Clone> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ObserverRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("label", &self.config.registry.label)
            .field("listeners", &self.snapshot.load().len())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

/// Copy `items` into a fresh snapshot of exactly `len` elements
///
/// The element buffer is the only allocation that grows with the registry
/// and is reserved fallibly. The `Arc` around it holds a fixed-size `Vec`
/// header; stable Rust has no fallible `Arc` constructor, so that allocation
/// still aborts on exhaustion.
fn rebuild<'a, T: Clone + 'a>(
    items: impl Iterator<Item = &'a T>,
    len: usize,
) -> Result<Arc<Vec<T>>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.extend(items.cloned());
    Ok(Arc::new(buf))
}
