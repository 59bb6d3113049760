//! Concurrent registry access
//!
//! `cargo test -p relay-foundation --test concurrency`

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use relay_foundation::{ObserverRegistry, Snapshot};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

const WRITERS: usize = 8;
const PER_WRITER: usize = 64;

const STALLING_ID: u32 = 999;
const STALL: Duration = Duration::from_millis(300);

/// Listener whose comparison against `STALLING_ID` takes `STALL`
#[derive(Debug, Clone)]
struct Stalling(u32);

impl PartialEq for Stalling {
    fn eq(&self, other: &Self) -> bool {
        if self.0 == STALLING_ID || other.0 == STALLING_ID {
            thread::sleep(STALL);
        }
        self.0 == other.0
    }
}

#[test]
fn test_concurrent_distinct_adds_lose_nothing() {
    for seed in 0..20u64 {
        let registry = Arc::new(ObserverRegistry::<usize>::new());
        let barrier = Arc::new(Barrier::new(WRITERS));

        let handles: Vec<_> = (0..WRITERS)
            .map(|w| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mut ids: Vec<usize> =
                        (0..PER_WRITER).map(|i| w * PER_WRITER + i).collect();
                    ids.shuffle(&mut StdRng::seed_from_u64(seed * 100 + w as u64));
                    barrier.wait();
                    for id in ids {
                        assert!(registry.add(id).unwrap());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("writer panicked");
        }

        let snapshot = registry.snapshot();
        let unique: HashSet<usize> = snapshot.iter().copied().collect();
        assert_eq!(snapshot.len(), WRITERS * PER_WRITER, "seed {}", seed);
        assert_eq!(unique.len(), WRITERS * PER_WRITER, "seed {}", seed);
        assert!((0..WRITERS * PER_WRITER).all(|id| unique.contains(&id)));
    }
}

#[test]
fn test_concurrent_duplicate_adds_keep_one() {
    let registry = Arc::new(ObserverRegistry::<i32>::new());
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..32).filter(|id| registry.add(*id).unwrap()).count()
            })
        })
        .collect();

    let inserted: usize = handles
        .into_iter()
        .map(|h| h.join().expect("writer panicked"))
        .sum();

    assert_eq!(inserted, 32);
    let mut ids: Vec<i32> = registry.snapshot().to_vec();
    ids.sort_unstable();
    assert_eq!(ids, (0..32).collect::<Vec<_>>());
}

#[test]
fn test_readers_never_see_torn_snapshots() {
    let registry = Arc::new(ObserverRegistry::<u32>::new());
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut observed = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    let snapshot: Snapshot<u32> = registry.snapshot();
                    let unique: HashSet<u32> = snapshot.iter().copied().collect();
                    assert_eq!(unique.len(), snapshot.len(), "duplicate in snapshot");
                    // Writers add 2k before 2k+1 and remove 2k+1 before 2k.
                    for id in snapshot.iter().filter(|id| *id % 2 == 1) {
                        assert!(unique.contains(&(id - 1)), "torn snapshot at {}", id);
                    }
                    observed += 1;
                }
                observed
            })
        })
        .collect();

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(42);
            for _ in 0..2_000 {
                let k: u32 = rng.gen_range(0..64);
                if rng.gen_bool(0.6) {
                    registry.add(2 * k).unwrap();
                    registry.add(2 * k + 1).unwrap();
                } else {
                    registry.remove(&(2 * k + 1)).unwrap();
                    registry.remove(&(2 * k)).unwrap();
                }
            }
        })
    };

    writer.join().expect("writer panicked");
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        assert!(reader.join().expect("reader panicked") > 0);
    }
}

#[test]
fn test_snapshot_held_across_concurrent_mutation() {
    let registry = Arc::new(ObserverRegistry::new());
    for id in 0..10u32 {
        registry.add(id).unwrap();
    }
    let held = registry.snapshot();

    let handles: Vec<_> = (0..4u32)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for id in 0..10u32 {
                    if id % 4 == t {
                        registry.remove(&id).unwrap();
                    }
                }
                registry.add(100 + t).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("mutator panicked");
    }

    assert_eq!(held.to_vec(), (0..10).collect::<Vec<_>>());
    let mut current = registry.snapshot().to_vec();
    current.sort_unstable();
    assert_eq!(current, vec![100, 101, 102, 103]);
}

#[test]
fn test_readers_not_blocked_by_slow_comparisons() {
    let registry = Arc::new(ObserverRegistry::new());
    registry.add(Stalling(1)).unwrap();

    // A reader scanning with a slow comparison.
    let scanner = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.contains(&Stalling(STALLING_ID)))
    };
    thread::sleep(Duration::from_millis(50));

    // A writer stuck in its duplicate check while holding the member lock.
    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            registry.add(Stalling(STALLING_ID)).unwrap();
            registry.remove_all().unwrap();
        })
    };
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    let snapshot = registry.snapshot();
    let len = registry.len();
    let waited = started.elapsed();

    assert!(waited < Duration::from_millis(100), "reader blocked for {:?}", waited);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(len, 1);

    assert!(!scanner.join().expect("scanner panicked"));
    writer.join().expect("writer panicked");
    assert!(registry.is_empty());
}
