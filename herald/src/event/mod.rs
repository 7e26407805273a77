//! Typed publish/subscribe notification channel.
//!
//! This module provides [`Event<T>`], which delivers a payload of type `T` to every handler
//! registered on it. Handlers come in two shapes:
//!
//! - **Method**: a function of the target and the payload, `Fn(&U, T)`. Passing a method
//!   path such as `Recorder::record` is the common case.
//! - **Closure**: a function of the payload alone, `Fn(T)`, whose lifetime is scoped to a
//!   target it does not otherwise use.
//!
//! # Ownership
//!
//! Targets are passed as `&Arc<U>` and held weakly. A registration lives until its
//! [`Disposable`] is disposed or its target is dropped, whichever comes first. Dropped
//! targets are noticed lazily: the entry is removed, without a call, the next time a raise
//! reaches it.
//!
//! # Execution contexts
//!
//! A registration may carry an [`Executor`]. Such handlers are submitted to the executor and
//! run whenever and wherever it decides; the raise does not wait for them. Handlers without
//! an executor run inline, in registration order, before [`raise()`](Event::raise) returns.
//!
//! # Thread Safety
//!
//! The handler list carries no lock. `Event`, [`Handler`] and [`Disposable`] are neither
//! `Send` nor `Sync`, so every registration, disposal and raise for one event happens on the
//! thread that created it. Targets, handler functions and payloads must be `Send` because
//! offloaded handlers run on executor threads.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use herald::Event;
//!
//! #[derive(Default)]
//! struct Scoreboard {
//!     scores: Mutex<Vec<u32>>,
//! }
//!
//! impl Scoreboard {
//!     fn on_score(&self, score: u32) {
//!         self.scores.lock().unwrap().push(score);
//!     }
//! }
//!
//! let scored = Event::<u32>::new();
//! let board = Arc::new(Scoreboard::default());
//! let registration = scored.add_handler(&board, None, Scoreboard::on_score);
//!
//! scored.raise(10);
//! assert_eq!(*board.scores.lock().unwrap(), vec![10]);
//!
//! registration.dispose();
//! scored.raise(20);
//! assert_eq!(*board.scores.lock().unwrap(), vec![10]);
//! ```

mod dispose;
mod handler;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Weak};

use log::{debug, trace};

pub use dispose::{Disposable, DisposeBag};
pub use handler::Handler;

use crate::tasks::Executor;
use handler::{Callback, Entry};

type WatchersChangeFn<T> = dyn Fn(&Event<T>, &[Handler<T>]);

/// Shared state behind an [`Event`] and its clones.
pub(crate) struct State<T> {
    entries: RefCell<Vec<Rc<Entry<T>>>>,
    watchers_change: RefCell<Option<Rc<WatchersChangeFn<T>>>>,
    next_id: Cell<u64>,
}

impl<T: Clone + Send + 'static> State<T> {
    /// Filters `entry` out of the list by identity. Notifies watchers only if something was
    /// actually removed.
    pub(crate) fn remove(state: &Rc<Self>, entry: &Entry<T>) {
        let removed = {
            let mut entries = state.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|e| !std::ptr::eq(Rc::as_ptr(e), entry));
            entries.len() != before
        };

        if removed {
            trace!("Removed handler {}", entry.id());
            Event {
                state: Rc::clone(state),
            }
            .notify_watchers(&[]);
        }
    }
}

/// A typed publish/subscribe channel.
///
/// Cloning an `Event` creates a new handle to the **same** handler list.
pub struct Event<T> {
    state: Rc<State<T>>,
}

impl<T: Clone + Send + 'static> Event<T> {
    /// Creates an event with no handlers.
    pub fn new() -> Self {
        Self {
            state: Rc::new(State {
                entries: RefCell::new(Vec::new()),
                watchers_change: RefCell::new(None),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Delivers `data` to every registered handler whose target is still alive.
    ///
    /// Equivalent to `raise_on(data, None)`.
    pub fn raise(&self, data: T) {
        self.raise_on(data, None);
    }

    /// Delivers `data` to `handlers`, or to every registered handler when `None`.
    ///
    /// Handlers in the subset that are no longer registered on this event are skipped.
    /// For each handler, in order: if its target has been dropped the handler is removed
    /// and skipped; if it has an executor the call is submitted there; otherwise it runs
    /// before moving on to the next handler.
    ///
    /// The handler list is snapshotted before any handler runs, so handlers may register
    /// or dispose freely. Handlers disposed during the raise are not called.
    pub fn raise_on(&self, data: T, handlers: Option<&[Handler<T>]>) {
        let targets: Vec<Rc<Entry<T>>> = {
            let entries = self.state.entries.borrow();
            match handlers {
                None => entries.clone(),
                Some(subset) => subset
                    .iter()
                    .filter(|handler| entries.iter().any(|e| Rc::ptr_eq(e, &handler.entry)))
                    .map(|handler| Rc::clone(&handler.entry))
                    .collect(),
            }
        };

        trace!("Raising event to {} handler(s)", targets.len());

        let mut targets = targets.into_iter().peekable();
        while let Some(entry) = targets.next() {
            if targets.peek().is_none() {
                entry.deliver(data);
                return;
            }
            entry.deliver(data.clone());
        }
    }

    /// Registers a method-shaped handler, called as `handler(&target, data)`.
    ///
    /// `target` is held weakly. When `executor` is set the call is submitted to it instead
    /// of running on the raising thread.
    pub fn add_handler<U, F>(
        &self,
        target: &Arc<U>,
        executor: Option<Arc<dyn Executor>>,
        handler: F,
    ) -> Disposable
    where
        U: Send + Sync + 'static,
        F: Fn(&U, T) + Send + Sync + 'static,
    {
        self.register(target, executor, Callback::method::<U, F>(handler))
    }

    /// Registers a closure whose registration lives as long as `target`.
    ///
    /// The closure is owned by the event; `target` is held weakly and only decides when the
    /// registration ends.
    pub fn add_closure_handler<U, F>(
        &self,
        target: &Arc<U>,
        executor: Option<Arc<dyn Executor>>,
        closure: F,
    ) -> Disposable
    where
        U: Send + Sync + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.register(target, executor, Callback::closure(closure))
    }

    fn register<U>(
        &self,
        target: &Arc<U>,
        executor: Option<Arc<dyn Executor>>,
        callback: Callback<T>,
    ) -> Disposable
    where
        U: Send + Sync + 'static,
    {
        let weak: Weak<U> = Arc::downgrade(target);
        let target: Weak<dyn Any + Send + Sync> = weak;
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);

        let entry = Rc::new(Entry::new(
            id,
            target,
            callback,
            executor,
            Rc::downgrade(&self.state),
        ));
        self.state.entries.borrow_mut().push(Rc::clone(&entry));

        debug!(
            "Registered handler {} ({} registered)",
            id,
            self.handlers_count()
        );

        self.notify_watchers(&[Handler {
            entry: Rc::clone(&entry),
        }]);

        Disposable::new(entry)
    }

    /// Number of registered handlers, including ones whose target has been dropped but that
    /// no raise has reached yet.
    pub fn handlers_count(&self) -> usize {
        self.state.entries.borrow().len()
    }

    /// Returns `true` if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.state.entries.borrow().is_empty()
    }

    /// Returns the registered handlers in registration order.
    pub fn handlers(&self) -> Vec<Handler<T>> {
        self.state
            .entries
            .borrow()
            .iter()
            .map(|entry| Handler {
                entry: Rc::clone(entry),
            })
            .collect()
    }

    /// Removes every handler. The event stays usable.
    pub fn dispose_all(&self) {
        let removed = std::mem::take(&mut *self.state.entries.borrow_mut());
        if removed.is_empty() {
            return;
        }

        for entry in &removed {
            entry.mark_disposed();
        }
        debug!("Disposed all {} handler(s)", removed.len());
        self.notify_watchers(&[]);
    }

    /// Sets the callback invoked whenever the handler list changes.
    ///
    /// The callback receives the event and the handlers that were just added. On removal it
    /// receives an empty slice. It replaces any previously set callback.
    ///
    /// The callback is held strongly by the event; capturing a clone of the event in it
    /// creates a cycle that keeps the event alive.
    pub fn set_watchers_change_handler<F>(&self, callback: F)
    where
        F: Fn(&Event<T>, &[Handler<T>]) + 'static,
    {
        *self.state.watchers_change.borrow_mut() = Some(Rc::new(callback));
    }

    /// Removes the watchers-change callback, if any.
    pub fn clear_watchers_change_handler(&self) {
        self.state.watchers_change.borrow_mut().take();
    }

    fn notify_watchers(&self, added: &[Handler<T>]) {
        let callback = self.state.watchers_change.borrow().clone();
        if let Some(callback) = callback {
            callback(self, added);
        }
    }
}

impl Event<()> {
    /// Raises an event that carries no payload.
    pub fn raise_unit(&self) {
        self.raise(());
    }
}

impl<T: Clone + Send + 'static> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("handlers", &self.state.entries.borrow().len())
            .field(
                "watched",
                &self.state.watchers_change.borrow().is_some(),
            )
            .finish()
    }
}
