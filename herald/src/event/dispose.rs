//! Handles for cancelling registrations.

use std::fmt;
use std::rc::Rc;

/// Something that can be cancelled once.
pub(crate) trait Dispose {
    fn dispose(&self);
    fn is_disposed(&self) -> bool;
}

/// Returned from every handler registration. Calling [`dispose()`](Self::dispose) removes
/// the registration from its event.
///
/// Disposal is idempotent: disposing twice, disposing after the handler's target was
/// dropped, or disposing after the event itself is gone all do nothing. Dropping a
/// `Disposable` does *not* dispose it; the registration then lives until its target is
/// dropped. Use a [`DisposeBag`] for drop-scoped registrations.
#[derive(Clone)]
pub struct Disposable {
    inner: Rc<dyn Dispose>,
}

impl Disposable {
    pub(crate) fn new(inner: Rc<dyn Dispose>) -> Self {
        Self { inner }
    }

    /// Removes the registration from its event.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Returns `true` once the registration is no longer attached to an event.
    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Moves this disposable into `bag`, tying the registration to the bag's lifetime.
    pub fn disposed_by(self, bag: &mut DisposeBag) {
        bag.insert(self);
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A collection of [`Disposable`]s that are all disposed when the bag is dropped.
#[derive(Debug, Default)]
pub struct DisposeBag {
    items: Vec<Disposable>,
}

impl DisposeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, disposable: Disposable) {
        self.items.push(disposable);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Disposes every held registration and empties the bag. The bag can be reused.
    pub fn dispose_all(&mut self) {
        for disposable in self.items.drain(..) {
            disposable.dispose();
        }
    }
}

impl Extend<Disposable> for DisposeBag {
    fn extend<I: IntoIterator<Item = Disposable>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
