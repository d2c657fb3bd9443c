use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use super::{NodeId, Observer, Source, Subscribers, propagate, tracking};

/// Mutable reactive cell.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

struct SignalInner<T> {
    id: NodeId,
    value: RefCell<T>,
    version: Cell<u64>,
    subscribers: Subscribers,
}

impl<T: 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: NodeId::next(),
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: Subscribers::default(),
            }),
        }
    }

    /// Borrow the current value, registering a dependency.
    pub fn read(&self) -> Ref<'_, T> {
        tracking::record(self.inner.clone());
        self.inner.value.borrow()
    }

    /// Replace the value and settle the graph before returning.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.inner.version.set(self.inner.version.get() + 1);
        propagate(&self.inner.subscribers);
    }

    /// Number of writes since creation.
    #[cfg(test)]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of live observers.
    #[cfg(test)]
    pub fn observer_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<T: Clone + 'static> Signal<T> {
    pub fn get(&self) -> T {
        self.read().clone()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Source for SignalInner<T> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn used_by(&self, observer: Weak<dyn Observer>) {
        self.subscribers.add(observer);
    }

    fn not_used_by(&self, id: NodeId) {
        self.subscribers.remove(id);
    }
}
