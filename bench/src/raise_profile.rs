//! Raise timing split by whether the raise removed entries.
//!
//! A raise that reaches handlers whose targets were dropped also unlinks those entries, so
//! its cost depends on how much the listener population churned since the previous raise.
//! Criterion averages those raises together with the steady ones; [`RaiseProfile`] files
//! them separately and estimates the extra cost of each removed entry.

use std::fmt;
use std::time::{Duration, Instant};

use herald::Event;

/// Raise durations, grouped into steady raises and raises that swept dead entries.
#[derive(Debug, Clone, Default)]
pub struct RaiseProfile {
    steady: Vec<Duration>,
    sweeping: Vec<Duration>,
    swept_entries: usize,
}

impl RaiseProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises `data` on `event`, timing the call and counting the entries it removed.
    pub fn raise<T: Clone + Send + 'static>(&mut self, event: &Event<T>, data: T) {
        let before = event.handlers_count();
        let start = Instant::now();
        event.raise(data);
        let elapsed = start.elapsed();
        self.record(elapsed, before.saturating_sub(event.handlers_count()));
    }

    /// Files one raise that took `elapsed` and removed `swept` entries.
    pub fn record(&mut self, elapsed: Duration, swept: usize) {
        if swept == 0 {
            self.steady.push(elapsed);
        } else {
            self.sweeping.push(elapsed);
            self.swept_entries += swept;
        }
    }

    pub fn steady_raises(&self) -> usize {
        self.steady.len()
    }

    pub fn sweeping_raises(&self) -> usize {
        self.sweeping.len()
    }

    /// Entries removed across all sweeping raises.
    pub fn swept_entries(&self) -> usize {
        self.swept_entries
    }

    /// Time spent in every recorded raise.
    pub fn total(&self) -> Duration {
        self.steady.iter().chain(&self.sweeping).sum()
    }

    pub fn steady_mean(&self) -> Duration {
        mean(&self.steady)
    }

    pub fn sweeping_mean(&self) -> Duration {
        mean(&self.sweeping)
    }

    /// Time a sweeping raise spends above the steady mean, divided over the entries it
    /// removed. `None` until both kinds of raise have been seen.
    pub fn cost_per_swept_entry(&self) -> Option<Duration> {
        if self.steady.is_empty() || self.swept_entries == 0 {
            return None;
        }
        let sweeping_total: Duration = self.sweeping.iter().sum();
        let baseline = self.steady_mean() * self.sweeping.len() as u32;
        Some(sweeping_total.saturating_sub(baseline) / self.swept_entries as u32)
    }
}

impl fmt::Display for RaiseProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "steady: {} raises, avg {:.2}us; sweeping: {} raises, avg {:.2}us, {} entries removed",
            self.steady_raises(),
            self.steady_mean().as_secs_f64() * 1_000_000.0,
            self.sweeping_raises(),
            self.sweeping_mean().as_secs_f64() * 1_000_000.0,
            self.swept_entries,
        )?;
        if let Some(cost) = self.cost_per_swept_entry() {
            write!(f, " (+{}ns each)", cost.as_nanos())?;
        }
        Ok(())
    }
}

fn mean(samples: &[Duration]) -> Duration {
    if samples.is_empty() {
        Duration::ZERO
    } else {
        samples.iter().sum::<Duration>() / samples.len() as u32
    }
}
