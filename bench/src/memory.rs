//! Heap cost of handlers, measured with dhat.
//!
//! Each measurement registers a batch of handlers of one shape and delivery mode on a fresh
//! event, then raises once, recording the heap growth of both steps. Registration cost is
//! dominated by the entry allocation; raise cost shows the task boxing of offloaded
//! delivery.
//!
//! Heap numbers are only collected with the `memory_profiling` feature, which also installs
//! dhat's global allocator in the benches:
//!
//! ```bash
//! cargo bench -p herald_bench --features memory_profiling
//! ```
//!
//! Each measurement also leaves a `dhat-heap.json` that can be loaded in
//! <https://nnethercote.github.io/dh_view/dh_view.html>.

use std::fmt;
use std::sync::Arc;

use herald::{Event, Executor, Inline};

use crate::listeners::Counter;

/// How a handler is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Method,
    Closure,
}

/// Where a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Inline,
    /// Submitted through an executor. The measurement uses [`Inline`] as the executor so
    /// no worker thread allocates concurrently.
    Offloaded,
}

impl Shape {
    pub const ALL: [Shape; 2] = [Shape::Method, Shape::Closure];
}

impl Delivery {
    pub const ALL: [Delivery; 2] = [Delivery::Inline, Delivery::Offloaded];
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shape::Method => "method",
            Shape::Closure => "closure",
        })
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Delivery::Inline => "inline",
            Delivery::Offloaded => "offloaded",
        })
    }
}

/// Heap growth over one measured step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapDelta {
    pub bytes: u64,
    pub blocks: u64,
}

impl HeapDelta {
    pub fn bytes_per(&self, handlers: usize) -> f64 {
        if handlers == 0 {
            0.0
        } else {
            self.bytes as f64 / handlers as f64
        }
    }

    pub fn blocks_per(&self, handlers: usize) -> f64 {
        if handlers == 0 {
            0.0
        } else {
            self.blocks as f64 / handlers as f64
        }
    }
}

/// Cost of one batch of handlers of a single shape and delivery mode.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerCost {
    pub shape: Shape,
    pub delivery: Delivery,
    pub handlers: usize,
    /// Payloads that reached the target during the measured raise.
    pub delivered: u64,
    /// `None` without the `memory_profiling` feature.
    pub register: Option<HeapDelta>,
    /// `None` without the `memory_profiling` feature.
    pub raise: Option<HeapDelta>,
}

impl fmt::Display for HandlerCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} x{}: ", self.shape, self.delivery, self.handlers)?;
        match (self.register, self.raise) {
            (Some(register), Some(raise)) => write!(
                f,
                "register {:.1} B / {:.2} allocs, raise {:.1} B / {:.2} allocs per handler",
                register.bytes_per(self.handlers),
                register.blocks_per(self.handlers),
                raise.bytes_per(self.handlers),
                raise.blocks_per(self.handlers),
            ),
            _ => f.write_str("heap not profiled"),
        }
    }
}

/// Registers `handlers` handlers of `shape` on one target, raises once, and reports the
/// heap growth of each step.
pub fn handler_cost(shape: Shape, delivery: Delivery, handlers: usize) -> HandlerCost {
    #[cfg(feature = "memory_profiling")]
    let _profiler = dhat::Profiler::new_heap();

    let event = Event::<u64>::new();
    let target = Arc::new(Counter::default());
    let executor: Option<Arc<dyn Executor>> = match delivery {
        Delivery::Inline => None,
        Delivery::Offloaded => Some(Arc::new(Inline)),
    };

    let ((), register) = heap_delta(|| {
        for _ in 0..handlers {
            let _ = match shape {
                Shape::Method => event.add_handler(&target, executor.clone(), Counter::on_event),
                Shape::Closure => {
                    let sink = Arc::clone(&target);
                    event.add_closure_handler(&target, executor.clone(), move |value| {
                        sink.on_event(value)
                    })
                }
            };
        }
    });
    let ((), raise) = heap_delta(|| event.raise(1));

    HandlerCost {
        shape,
        delivery,
        handlers,
        delivered: target.hits(),
        register,
        raise,
    }
}

/// Every shape and delivery combination for `handlers` handlers.
pub fn handler_cost_matrix(handlers: usize) -> Vec<HandlerCost> {
    Shape::ALL
        .into_iter()
        .flat_map(|shape| {
            Delivery::ALL
                .into_iter()
                .map(move |delivery| handler_cost(shape, delivery, handlers))
        })
        .collect()
}

#[cfg(feature = "memory_profiling")]
fn heap_delta<R>(f: impl FnOnce() -> R) -> (R, Option<HeapDelta>) {
    let before = dhat::HeapStats::get();
    let result = f();
    let after = dhat::HeapStats::get();
    let delta = HeapDelta {
        bytes: (after.total_bytes - before.total_bytes) as u64,
        blocks: (after.total_blocks - before.total_blocks) as u64,
    };
    (result, Some(delta))
}

#[cfg(not(feature = "memory_profiling"))]
fn heap_delta<R>(f: impl FnOnce() -> R) -> (R, Option<HeapDelta>) {
    (f(), None)
}
