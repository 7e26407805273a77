//! Typed event notification with weakly held subscribers.
//!
//! - [`Event<T>`]: publish a payload to every registered handler.
//! - [`Disposable`] / [`DisposeBag`]: cancel registrations early.
//! - [`tasks`]: execution contexts handlers can be offloaded to.

pub mod event;
pub mod tasks;

pub use event::{Disposable, DisposeBag, Event, Handler};
pub use tasks::{Executor, Inline, PoolConfig, PoolHandle, SubmitError, ThreadPool};
