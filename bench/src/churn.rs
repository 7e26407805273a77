//! Subscriber churn benchmark scenario.
//!
//! Simulates an event whose listener population keeps changing:
//! - A fixed number of live listeners is maintained
//! - Between raises, some targets are dropped (implicit unsubscription) and some handles
//!   are disposed (explicit unsubscription), and replacements are registered
//! - Optionally, a share of the listeners is delivered on a worker pool
//!
//! This scenario tests:
//! - Raise cost when stale entries have to be detected and removed
//! - Registration and disposal throughput under a steady population

use std::sync::Arc;

use herald::{Disposable, Event, Executor, PoolConfig, ThreadPool};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::listeners::Counter;

/// Configuration for the churn benchmark.
#[derive(Debug, Clone)]
pub struct ChurnConfig {
    /// Number of listeners kept registered.
    pub listener_count: usize,
    /// Probability that a listener's target is dropped after a raise.
    pub drop_rate: f64,
    /// Probability that a listener is disposed after a raise.
    pub dispose_rate: f64,
    /// Share of listeners delivered on the pool instead of inline.
    pub offload_rate: f64,
    /// The number of pool threads used for offloaded listeners.
    pub executor_threads: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            listener_count: 1_000,
            drop_rate: 0.05,
            dispose_rate: 0.05,
            offload_rate: 0.0,
            executor_threads: 2,
            seed: 12345,
        }
    }
}

struct Slot {
    target: Arc<Counter>,
    disposable: Disposable,
}

/// Running state of the churn scenario.
pub struct ChurnScenario {
    config: ChurnConfig,
    event: Event<u64>,
    rng: ChaCha8Rng,
    pool: Option<Arc<dyn Executor>>,
    slots: Vec<Slot>,
    raised: u64,
    replaced: usize,
}

impl ChurnScenario {
    pub fn with_config(config: ChurnConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            event: Event::new(),
            rng,
            pool: None,
            slots: Vec::new(),
            raised: 0,
            replaced: 0,
        }
    }

    /// Start the pool (if any listener is offloaded) and register the initial listeners.
    pub fn setup(&mut self) -> std::io::Result<()> {
        if self.config.offload_rate > 0.0 {
            let pool: Arc<dyn Executor> = Arc::new(ThreadPool::with_config(PoolConfig {
                threads: self.config.executor_threads,
                name: String::from("churn"),
            })?);
            self.pool = Some(pool);
        }

        let mut slots = Vec::with_capacity(self.config.listener_count);
        for _ in 0..self.config.listener_count {
            slots.push(self.new_slot());
        }
        self.slots = slots;
        Ok(())
    }

    /// Raise once, then churn the listener population.
    pub fn update(&mut self) {
        self.event.raise(self.raised);
        self.raised += 1;
        self.churn();
    }

    /// Drop, dispose and replace listeners without raising.
    pub fn churn(&mut self) {
        for index in 0..self.slots.len() {
            let roll: f64 = self.rng.gen_range(0.0..1.0);
            if roll < self.config.drop_rate {
                // The old target goes away with the slot; its entry is cleaned up lazily.
                let slot = self.new_slot();
                self.slots[index] = slot;
                self.replaced += 1;
            } else if roll < self.config.drop_rate + self.config.dispose_rate {
                self.slots[index].disposable.dispose();
                let slot = self.new_slot();
                self.slots[index] = slot;
                self.replaced += 1;
            }
        }
    }

    /// Dispose every listener and stop the pool.
    pub fn teardown(&mut self) {
        self.event.dispose_all();
        self.slots.clear();
        self.pool = None;
    }

    /// The event under churn, for callers that time raises themselves.
    pub fn event(&self) -> &Event<u64> {
        &self.event
    }

    /// Handlers currently registered, including dropped targets not yet cleaned up.
    pub fn handlers_count(&self) -> usize {
        self.event.handlers_count()
    }

    /// Number of listeners that were replaced so far.
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    /// Total payloads received by the current listeners.
    pub fn delivered(&self) -> u64 {
        self.slots.iter().map(|slot| slot.target.hits()).sum()
    }

    fn new_slot(&mut self) -> Slot {
        let executor = match &self.pool {
            Some(pool) if self.rng.gen_bool(self.config.offload_rate) => Some(Arc::clone(pool)),
            _ => None,
        };
        let target = Arc::new(Counter::default());
        let disposable = self.event.add_handler(&target, executor, Counter::on_event);
        Slot { target, disposable }
    }
}
