//! Execution contexts for event delivery.
//!
//! An [`Executor`] is anywhere a unit of work can be handed off to run later, possibly on
//! another thread. Handlers registered on an [`Event`](crate::Event) with an executor are
//! submitted to it instead of running on the thread that raised the event.
//!
//! Two executors are provided:
//!
//! - [`Inline`]: runs the task immediately on the submitting thread.
//! - [`ThreadPool`]: a fixed set of named worker threads fed from a shared queue. A pool
//!   with one worker behaves as a serial queue.

mod pool;

use std::fmt;
use std::sync::Arc;

pub use pool::{PoolConfig, PoolHandle, ThreadPool};

/// A unit of work submitted to an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run tasks handed to it.
///
/// Implementations decide where and when the task runs. The submitter never waits for the
/// task to finish.
pub trait Executor: Send + Sync {
    /// Hand a task off for execution.
    fn submit(&self, task: Task) -> Result<(), SubmitError>;
}

/// Error returned when an executor refuses a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The executor has been shut down and no longer accepts work.
    Shutdown,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Shutdown => write!(f, "executor has shut down"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Runs every task immediately on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inline;

impl Executor for Inline {
    fn submit(&self, task: Task) -> Result<(), SubmitError> {
        task();
        Ok(())
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn submit(&self, task: Task) -> Result<(), SubmitError> {
        (**self).submit(task)
    }
}
