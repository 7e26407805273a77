//! Listener types used across benchmarks.
//!
//! These are the targets handlers are registered against. They keep their state in atomics
//! so the same types work for inline and offloaded delivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use herald::{Disposable, Event, Executor};

// =============================================================================
// Targets
// =============================================================================

/// Counts how many payloads it received.
#[derive(Debug, Default)]
pub struct Counter {
    hits: AtomicU64,
}

impl Counter {
    pub fn on_event(&self, _value: u64) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

/// Sums the payloads it received.
#[derive(Debug, Default)]
pub struct Accumulator {
    sum: AtomicU64,
}

impl Accumulator {
    pub fn on_event(&self, value: u64) {
        self.sum.fetch_add(value, Ordering::Relaxed);
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Registration helpers
// =============================================================================

/// Registers `count` counters on `event` as method handlers.
///
/// Returns the targets (which keep the registrations alive) and their disposables, in
/// registration order.
pub fn register_counters(
    event: &Event<u64>,
    count: usize,
    executor: Option<Arc<dyn Executor>>,
) -> (Vec<Arc<Counter>>, Vec<Disposable>) {
    let mut targets = Vec::with_capacity(count);
    let mut disposables = Vec::with_capacity(count);

    for _ in 0..count {
        let counter = Arc::new(Counter::default());
        disposables.push(event.add_handler(&counter, executor.clone(), Counter::on_event));
        targets.push(counter);
    }

    (targets, disposables)
}

/// Closure registrations that feed one accumulator and share one scope owner.
pub struct ClosureGroup {
    pub sink: Arc<Accumulator>,
    /// Dropping this ends every registration in the group.
    pub owner: Arc<()>,
    pub disposables: Vec<Disposable>,
}

/// Registers `count` closure handlers on `event`, all scoped to a single owner.
pub fn register_closures(event: &Event<u64>, count: usize) -> ClosureGroup {
    let sink = Arc::new(Accumulator::default());
    let owner = Arc::new(());
    let disposables = (0..count)
        .map(|_| {
            let sink = Arc::clone(&sink);
            event.add_closure_handler(&owner, None, move |value| sink.on_event(value))
        })
        .collect();

    ClosureGroup {
        sink,
        owner,
        disposables,
    }
}
