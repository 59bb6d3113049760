//! Stress run - concurrent registration churn against live dispatch
//!
//! Writer tasks randomly add and remove listeners from a fixed pool while
//! reader tasks dispatch ticks. Every snapshot a reader sees is checked for
//! duplicate listeners.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relay_foundation::{
    DiagnosticSink, EventListener, ListenerError, ObserverRegistry, RelayConfig, SharedListener,
    TracingSink,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dispatched event
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub reader: usize,
    pub round: u64,
}

/// Listener used by the stress run
struct Probe {
    name: String,
    failing: bool,
    hits: AtomicU64,
}

impl EventListener<Tick> for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, tick: &Tick) -> Result<(), ListenerError> {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if self.failing {
            return Err(ListenerError::new(
                &self.name,
                format!("rejected tick {} from reader {}", tick.round, tick.reader),
            ));
        }
        Ok(())
    }
}

/// Stress run parameters
#[derive(Debug, Clone)]
pub struct StressOptions {
    pub writers: usize,
    pub readers: usize,
    pub listeners: usize,
    pub failing: usize,
    pub rounds: u64,
    pub seed: u64,
}

impl Default for StressOptions {
    fn default() -> Self {
        Self {
            writers: 4,
            readers: 4,
            listeners: 32,
            failing: 0,
            rounds: 10_000,
            seed: 7,
        }
    }
}

/// Stress run results
#[derive(Debug, Clone, Default)]
pub struct StressSummary {
    pub added: usize,
    pub removed: usize,
    pub ignored: usize,
    pub dispatches: u64,
    pub delivered: usize,
    pub failed: usize,
    pub evicted: usize,
    pub final_listeners: usize,
    pub violations: usize,
}

impl StressSummary {
    pub fn is_consistent(&self) -> bool {
        self.violations == 0
    }

    pub fn print(&self) {
        println!("\nRelay stress summary\n");
        println!("{:<18} {:>10}", "added", self.added);
        println!("{:<18} {:>10}", "removed", self.removed);
        println!("{:<18} {:>10}", "no-op mutations", self.ignored);
        println!("{:<18} {:>10}", "dispatch rounds", self.dispatches);
        println!("{:<18} {:>10}", "delivered", self.delivered);
        println!("{:<18} {:>10}", "failed", self.failed);
        println!("{:<18} {:>10}", "evicted", self.evicted);
        println!("{:<18} {:>10}", "final listeners", self.final_listeners);
        println!("{:<18} {:>10}", "violations", self.violations);
    }
}

#[derive(Default)]
struct Counters {
    added: AtomicUsize,
    removed: AtomicUsize,
    ignored: AtomicUsize,
    delivered: AtomicUsize,
    failed: AtomicUsize,
    evicted: AtomicUsize,
    violations: AtomicUsize,
}

/// Run the stress scenario
pub async fn run(config: RelayConfig, options: StressOptions) -> anyhow::Result<StressSummary> {
    anyhow::ensure!(options.listeners > 0, "at least one listener is required");
    anyhow::ensure!(
        options.failing <= options.listeners,
        "failing listeners ({}) exceed pool size ({})",
        options.failing,
        options.listeners
    );

    info!(
        writers = options.writers,
        readers = options.readers,
        listeners = options.listeners,
        rounds = options.rounds,
        "Starting stress run"
    );

    let sink: Arc<dyn DiagnosticSink> = Arc::new(TracingSink);
    let registry: Arc<ObserverRegistry<SharedListener<Tick>>> =
        Arc::new(ObserverRegistry::from_config(config, Some(sink)));
    let pool: Arc<Vec<SharedListener<Tick>>> = Arc::new(
        (0..options.listeners)
            .map(|i| {
                SharedListener::listener(Probe {
                    name: format!("probe-{}", i),
                    failing: i < options.failing,
                    hits: AtomicU64::new(0),
                })
            })
            .collect(),
    );
    let counters = Arc::new(Counters::default());

    let mut handles = Vec::with_capacity(options.writers + options.readers);

    for w in 0..options.writers {
        let registry = Arc::clone(&registry);
        let pool = Arc::clone(&pool);
        let counters = Arc::clone(&counters);
        let seed = options.seed.wrapping_add(w as u64);
        let rounds = options.rounds;
        handles.push(tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..rounds {
                let listener = &pool[rng.gen_range(0..pool.len())];
                let changed = if rng.gen_bool(0.5) {
                    let added = registry.add(listener.clone())?;
                    if added {
                        counters.added.fetch_add(1, Ordering::Relaxed);
                    }
                    added
                } else {
                    let removed = registry.remove(listener)?;
                    if removed {
                        counters.removed.fetch_add(1, Ordering::Relaxed);
                    }
                    removed
                };
                if !changed {
                    counters.ignored.fetch_add(1, Ordering::Relaxed);
                }
            }
            debug!(writer = w, "Writer finished");
            Ok(())
        }));
    }

    for r in 0..options.readers {
        let registry = Arc::clone(&registry);
        let counters = Arc::clone(&counters);
        let rounds = options.rounds;
        handles.push(tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            for round in 0..rounds {
                let snapshot = registry.snapshot();
                let unique: HashSet<&SharedListener<Tick>> = snapshot.iter().collect();
                if unique.len() != snapshot.len() {
                    counters.violations.fetch_add(1, Ordering::Relaxed);
                    warn!(reader = r, round, "Duplicate listener in snapshot");
                }

                let report = registry.notify(&Tick { reader: r, round })?;
                counters
                    .delivered
                    .fetch_add(report.delivered, Ordering::Relaxed);
                counters.failed.fetch_add(report.failed, Ordering::Relaxed);
                counters.evicted.fetch_add(report.evicted, Ordering::Relaxed);
            }
            debug!(reader = r, "Reader finished");
            Ok(())
        }));
    }

    for handle in handles {
        handle.await??;
    }

    let summary = StressSummary {
        added: counters.added.load(Ordering::Relaxed),
        removed: counters.removed.load(Ordering::Relaxed),
        ignored: counters.ignored.load(Ordering::Relaxed),
        dispatches: options.rounds * options.readers as u64,
        delivered: counters.delivered.load(Ordering::Relaxed),
        failed: counters.failed.load(Ordering::Relaxed),
        evicted: counters.evicted.load(Ordering::Relaxed),
        final_listeners: registry.len(),
        violations: counters.violations.load(Ordering::Relaxed),
    };

    info!(
        listeners = summary.final_listeners,
        violations = summary.violations,
        "Stress run finished"
    );
    Ok(summary)
}
