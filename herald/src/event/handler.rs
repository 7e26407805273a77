//! Handler entries: one per registration on an [`Event`](super::Event).
//!
//! An entry pairs a weakly held target with the function to call for it. The target is
//! stored type-erased as `Weak<dyn Any + Send + Sync>` so that entries for different target
//! types can live in the same list. At dispatch time the weak reference is upgraded exactly
//! once and the resulting strong reference is kept for the whole invocation, so a target
//! cannot be dropped between the liveness check and the call.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak as RcWeak};
use std::sync::{Arc, Weak};

use log::{trace, warn};

use super::State;
use super::dispose::Dispose;
use crate::tasks::Executor;

/// A type-erased, shareable target reference.
pub(crate) type Target = Arc<dyn Any + Send + Sync>;

type MethodFn<T> = dyn Fn(&(dyn Any + Send + Sync), T) + Send + Sync;
type ClosureFn<T> = dyn Fn(T) + Send + Sync;

/// The two handler shapes an entry can hold.
pub(crate) enum Callback<T> {
    /// Called as `method(target, payload)`.
    Method(Arc<MethodFn<T>>),
    /// Called as `closure(payload)`; the target only scopes the lifetime.
    Closure(Arc<ClosureFn<T>>),
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        match self {
            Callback::Method(f) => Callback::Method(Arc::clone(f)),
            Callback::Closure(f) => Callback::Closure(Arc::clone(f)),
        }
    }
}

impl<T: 'static> Callback<T> {
    /// Wraps a method-shaped handler for target type `U`.
    pub(crate) fn method<U, F>(handler: F) -> Self
    where
        U: Send + Sync + 'static,
        F: Fn(&U, T) + Send + Sync + 'static,
    {
        Callback::Method(Arc::new(move |target: &(dyn Any + Send + Sync), data: T| {
            // Entries are only ever built with a target of type `U`.
            if let Some(target) = target.downcast_ref::<U>() {
                handler(target, data);
            }
        }))
    }

    pub(crate) fn closure<F>(closure: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Callback::Closure(Arc::new(closure))
    }

    fn invoke(&self, target: &Target, data: T) {
        match self {
            Callback::Method(method) => method(target.as_ref(), data),
            Callback::Closure(closure) => closure(data),
        }
    }
}

impl<T> Callback<T> {
    fn kind(&self) -> &'static str {
        match self {
            Callback::Method(_) => "method",
            Callback::Closure(_) => "closure",
        }
    }
}

/// One registration on an event.
pub(crate) struct Entry<T> {
    id: u64,
    target: Weak<dyn Any + Send + Sync>,
    callback: Callback<T>,
    executor: Option<Arc<dyn Executor>>,
    owner: RcWeak<State<T>>,
    disposed: Cell<bool>,
}

impl<T: Clone + Send + 'static> Entry<T> {
    pub(crate) fn new(
        id: u64,
        target: Weak<dyn Any + Send + Sync>,
        callback: Callback<T>,
        executor: Option<Arc<dyn Executor>>,
        owner: RcWeak<State<T>>,
    ) -> Self {
        Self {
            id,
            target,
            callback,
            executor,
            owner,
            disposed: Cell::new(false),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Delivers `data` to this entry, or removes the entry if its target is gone.
    pub(crate) fn deliver(&self, data: T) {
        if self.disposed.get() {
            return;
        }

        // Upgrade once and hold on to the strong reference for the whole call.
        let Some(target) = self.target.upgrade() else {
            trace!("Handler {} target dropped, removing", self.id);
            self.remove();
            return;
        };

        match &self.executor {
            None => {
                trace!("Handler {} ({}) invoked inline", self.id, self.callback.kind());
                self.callback.invoke(&target, data);
            }
            Some(executor) => {
                trace!("Handler {} ({}) submitted", self.id, self.callback.kind());
                let callback = self.callback.clone();
                let task = Box::new(move || callback.invoke(&target, data));
                if let Err(err) = executor.submit(task) {
                    warn!("Handler {} was not delivered: {}", self.id, err);
                }
            }
        }
    }

    pub(crate) fn mark_disposed(&self) {
        self.disposed.set(true);
    }

    /// Removes this entry from its owning event. Safe to call any number of times.
    pub(crate) fn remove(&self) {
        self.disposed.set(true);
        if let Some(state) = self.owner.upgrade() {
            State::remove(&state, self);
        }
    }
}

impl<T: Clone + Send + 'static> Dispose for Entry<T> {
    fn dispose(&self) {
        self.remove();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get() || self.owner.strong_count() == 0
    }
}

/// An opaque reference to one registration on an [`Event`](super::Event).
///
/// Handlers are obtained from [`Event::handlers`](super::Event::handlers) or passed to the
/// watchers-change callback, and can be used to target a subset of handlers with
/// [`Event::raise_on`](super::Event::raise_on). Two `Handler`s compare equal when they refer
/// to the same registration.
pub struct Handler<T> {
    pub(crate) entry: Rc<Entry<T>>,
}

impl<T: Clone + Send + 'static> Handler<T> {
    /// Returns `true` while the handler's target is still alive.
    pub fn is_alive(&self) -> bool {
        self.entry.is_alive()
    }

    /// Returns `true` once the handler has been removed from its event.
    pub fn is_disposed(&self) -> bool {
        self.entry.is_disposed()
    }

    /// Removes the handler from its event. Same as disposing the registration's
    /// [`Disposable`](super::Disposable).
    pub fn dispose(&self) {
        self.entry.remove();
    }
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self {
            entry: Rc::clone(&self.entry),
        }
    }
}

impl<T> PartialEq for Handler<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.entry, &other.entry)
    }
}

impl<T> Eq for Handler<T> {}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.entry.id)
            .field("kind", &self.entry.callback.kind())
            .field("alive", &(self.entry.target.strong_count() > 0))
            .field("offloaded", &self.entry.executor.is_some())
            .finish()
    }
}
