use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::effect::EffectInner;
use super::{NodeId, Observer, Source, Subscribers, resubscribe, tracking};

/// Memoized derivation.
///
/// Recomputes only when read after an upstream change. Between changes `get`
/// hands out clones of the same `Rc`, so observers can compare by pointer.
pub struct Memo<T> {
    inner: Rc<MemoInner<T>>,
}

struct MemoInner<T> {
    id: NodeId,
    this: Weak<MemoInner<T>>,
    compute: Box<dyn Fn() -> T>,
    value: RefCell<Option<Rc<T>>>,
    /// Set by upstream writes, cleared when a recompute starts.
    stale: Cell<bool>,
    sources: RefCell<Vec<Rc<dyn Source>>>,
    subscribers: Subscribers,
    runs: Cell<u64>,
}

impl<T: 'static> Memo<T> {
    /// Create a memo. Nothing runs until the first `get`.
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        let inner = Rc::new_cyclic(|this| MemoInner {
            id: NodeId::next(),
            this: this.clone(),
            compute: Box::new(compute),
            value: RefCell::new(None),
            stale: Cell::new(true),
            sources: RefCell::new(Vec::new()),
            subscribers: Subscribers::default(),
            runs: Cell::new(0),
        });
        Self { inner }
    }

    /// Current value, recomputing first if an upstream changed.
    pub fn get(&self) -> Rc<T> {
        tracking::record(self.inner.clone());
        self.inner.refresh()
    }

    /// Current value without registering a dependency.
    pub fn get_untracked(&self) -> Rc<T> {
        self.inner.refresh()
    }

    /// Whether the next `get` will recompute.
    #[cfg(test)]
    pub fn is_stale(&self) -> bool {
        self.inner.stale.get()
    }

    /// How many times the computation has run.
    #[cfg(test)]
    pub fn runs(&self) -> u64 {
        self.inner.runs.get()
    }

    /// Number of live observers.
    #[cfg(test)]
    pub fn observer_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> MemoInner<T> {
    fn refresh(&self) -> Rc<T> {
        if !self.stale.get()
            && let Some(value) = self.value.borrow().as_ref()
        {
            return Rc::clone(value);
        }

        // Cleared before computing: a write during the compute re-marks it.
        self.stale.set(false);
        let (value, sources) = tracking::track(|| (self.compute)());
        self.runs.set(self.runs.get() + 1);

        let observer: Weak<dyn Observer> = self.this.clone();
        let old = std::mem::replace(&mut *self.sources.borrow_mut(), sources.clone());
        resubscribe(self.id, &observer, old, &sources);

        let value = Rc::new(value);
        *self.value.borrow_mut() = Some(Rc::clone(&value));
        value
    }
}

impl<T: 'static> Source for MemoInner<T> {
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

impl<T: 'static> Observer for MemoInner<T> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn invalidate(self: Rc<Self>, queue: &mut Vec<Rc<EffectInner>>) {
        // Already stale: nobody has read since the last mark, so every
        // downstream node was notified then.
        if self.stale.replace(true) {
            return;
        }
        for observer in self.subscribers.snapshot() {
            observer.invalidate(queue);
        }
    }
}
