//! Dispatch - deliver an event to every listener in a snapshot
//!
//! Delivery walks the snapshot taken when the round starts, in insertion
//! order. A listener that fails is reported to the sink and, unless
//! `dispatch.evictOnError` is off, removed from the registry. Listeners
//! added or removed during a round do not change that round.
//!
//! Panics inside a listener propagate to the caller.

use super::handle::ListenerRef;
use super::registry::ObserverRegistry;
use crate::Result;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

// ============================================================================
// EventListener
// ============================================================================

/// Error returned by a listener that could not handle an event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{listener}: {message}")]
pub struct ListenerError {
    pub listener: String,
    pub message: String,
}

impl ListenerError {
    pub fn new(listener: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            listener: listener.into(),
            message: message.into(),
        }
    }
}

/// Listener for events of type `Ev`
pub trait EventListener<Ev>: Send + Sync {
    /// Listener name (for debugging)
    fn name(&self) -> &str {
        "listener"
    }

    /// Handle one event
    fn on_event(&self, event: &Ev) -> std::result::Result<(), ListenerError>;
}

/// Identity handle to a boxed [`EventListener`]
pub type SharedListener<Ev> = ListenerRef<dyn EventListener<Ev>>;

impl<Ev> ListenerRef<dyn EventListener<Ev>> {
    /// Wrap a concrete listener as a shared trait object handle
    pub fn listener(listener: impl EventListener<Ev> + 'static) -> Self {
        Self::from(Arc::new(listener) as Arc<dyn EventListener<Ev>>)
    }
}

// ============================================================================
// DispatchReport
// ============================================================================

/// Outcome of one dispatch round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that handled the event
    pub delivered: usize,
    /// Listeners that returned an error
    pub failed: usize,
    /// Failed listeners removed from the registry
    pub evicted: usize,
}

impl DispatchReport {
    /// Listeners visited this round
    pub fn visited(&self) -> usize {
        self.delivered + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

// ============================================================================
// Dispatch
// ============================================================================

impl<T: PartialEq + Clone> ObserverRegistry<T> {
    /// Call `deliver` for each listener in the current snapshot
    ///
    /// Only an allocation failure while evicting a listener is returned as
    /// an error; listener failures are recorded in the report.
    pub fn fire<E, F>(&self, mut deliver: F) -> Result<DispatchReport>
    where
        F: FnMut(&T) -> std::result::Result<(), E>,
        E: StdError + 'static,
    {
        let snapshot = self.snapshot();
        let mut report = DispatchReport::default();

        for listener in &snapshot {
            match deliver(listener) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    if self.config().dispatch.evict_on_error {
                        if self.remove(listener)? {
                            report.evicted += 1;
                        }
                        self.report_error("removed event listener", &err);
                    } else {
                        self.report_error("event listener failed", &err);
                    }
                }
            }
        }

        trace!(
            registry = %self.label(),
            delivered = report.delivered,
            failed = report.failed,
            evicted = report.evicted,
            "Dispatched event"
        );
        Ok(report)
    }
}

impl<Ev> ObserverRegistry<SharedListener<Ev>> {
    /// Deliver `event` to every registered [`EventListener`]
    pub fn notify(&self, event: &Ev) -> Result<DispatchReport> {
        self.fire(|listener| listener.on_event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::listener::sink::DiagnosticSink;
    use crate::listener::testing::RecordingSink;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        name: String,
        count: AtomicUsize,
    }

    impl Counter {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                count: AtomicUsize::new(0),
            }
        }
    }

    impl EventListener<u32> for Counter {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_event(&self, _event: &u32) -> std::result::Result<(), ListenerError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl EventListener<u32> for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_event(&self, event: &u32) -> std::result::Result<(), ListenerError> {
            Err(ListenerError::new(self.name(), format!("rejected {}", event)))
        }
    }

    fn registry_with_sink(
        config: RelayConfig,
    ) -> (ObserverRegistry<SharedListener<u32>>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let registry =
            ObserverRegistry::from_config(config, Some(sink.clone() as Arc<dyn DiagnosticSink>));
        (registry, sink)
    }

    #[test]
    fn test_notify_delivers_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let registry = ObserverRegistry::new();
        for name in ["a", "b", "c"] {
            registry.add(name).unwrap();
        }

        let report = registry
            .fire(|name| {
                order.lock().push(*name);
                Ok::<(), ListenerError>(())
            })
            .unwrap();

        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
        assert_eq!(report.delivered, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn test_failing_listener_is_evicted() {
        let (registry, sink) = registry_with_sink(RelayConfig::default());
        let counter = Arc::new(Counter::new("counter"));
        let counter_ref = SharedListener::from(counter.clone() as Arc<dyn EventListener<u32>>);

        registry.add(SharedListener::listener(Failing)).unwrap();
        registry.add(counter_ref.clone()).unwrap();

        let report = registry.notify(&7).unwrap();
        assert_eq!(
            report,
            DispatchReport {
                delivered: 1,
                failed: 1,
                evicted: 1
            }
        );
        assert_eq!(counter.count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.snapshot(), [counter_ref]);

        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].1, "removed event listener");
        assert_eq!(errors[0].2, "failing: rejected 7");
    }

    #[test]
    fn test_failing_listener_kept_when_eviction_disabled() {
        let (registry, sink) = registry_with_sink(RelayConfig::new().evict_on_error(false));
        registry.add(SharedListener::listener(Failing)).unwrap();

        let report = registry.notify(&1).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.evicted, 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(sink.errors()[0].1, "event listener failed");

        registry.notify(&2).unwrap();
        assert_eq!(sink.errors().len(), 2);
    }

    #[test]
    fn test_listener_added_during_round_waits_for_next() {
        let registry = Arc::new(ObserverRegistry::new());
        registry.add(1u32).unwrap();

        let inner = Arc::clone(&registry);
        let report = registry
            .fire(|n| {
                inner.add(n + 10).unwrap();
                Ok::<(), ListenerError>(())
            })
            .unwrap();

        assert_eq!(report.visited(), 1);
        assert_eq!(registry.snapshot(), [1, 11]);
    }

    #[test]
    fn test_listener_removed_during_round_still_called() {
        let registry = Arc::new(ObserverRegistry::new());
        registry.add(1u32).unwrap();
        registry.add(2u32).unwrap();

        let inner = Arc::clone(&registry);
        let mut seen = Vec::new();
        registry
            .fire(|n| {
                inner.remove(&2).unwrap();
                seen.push(*n);
                Ok::<(), ListenerError>(())
            })
            .unwrap();

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(registry.snapshot(), [1]);
    }

    #[test]
    fn test_fire_on_empty_registry() {
        let registry: ObserverRegistry<SharedListener<u32>> = ObserverRegistry::new();
        assert_eq!(registry.notify(&0).unwrap(), DispatchReport::default());
    }
}
