use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::{NodeId, Observer, Source, resubscribe, tracking};

/// Observer that re-runs its body whenever something it read changes.
///
/// The body runs once on creation. Dropping the handle does not stop it;
/// only `dispose` does.
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

pub(crate) struct EffectInner {
    id: NodeId,
    this: Weak<EffectInner>,
    body: RefCell<Option<Box<dyn FnMut()>>>,
    sources: RefCell<Vec<Rc<dyn Source>>>,
    queued: Cell<bool>,
    disposed: Cell<bool>,
    runs: Cell<u64>,
}

impl Effect {
    pub fn new(body: impl FnMut() + 'static) -> Self {
        let inner = Rc::new_cyclic(|this| EffectInner {
            id: NodeId::next(),
            this: this.clone(),
            body: RefCell::new(Some(Box::new(body))),
            sources: RefCell::new(Vec::new()),
            queued: Cell::new(false),
            disposed: Cell::new(false),
            runs: Cell::new(0),
        });
        // Strong reference for the graph: upstream nodes only hold weak ones.
        KEEP_ALIVE.with(|alive| alive.borrow_mut().push(Rc::clone(&inner)));
        inner.execute();
        Self { inner }
    }

    /// Stop re-running and release every upstream registration.
    ///
    /// Returns `true` on the first call, `false` afterwards.
    pub fn dispose(&self) -> bool {
        self.inner.dispose()
    }

    #[cfg(test)]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// How many times the body has run.
    #[cfg(test)]
    pub fn runs(&self) -> u64 {
        self.inner.runs.get()
    }
}

thread_local! {
    /// Live effects. An effect leaves this list when disposed.
    static KEEP_ALIVE: RefCell<Vec<Rc<EffectInner>>> = const { RefCell::new(Vec::new()) };
}

impl EffectInner {
    pub(crate) fn execute(&self) {
        self.queued.set(false);
        if self.disposed.get() {
            return;
        }

        // A body that re-triggers itself is already running with fresh reads.
        let Ok(mut body) = self.body.try_borrow_mut() else {
            return;
        };
        let Some(body) = body.as_mut() else {
            return;
        };

        let ((), sources) = tracking::track(body);
        self.runs.set(self.runs.get() + 1);

        let observer: Weak<dyn Observer> = self.this.clone();
        let old = std::mem::replace(&mut *self.sources.borrow_mut(), sources.clone());
        resubscribe(self.id, &observer, old, &sources);
    }

    fn dispose(&self) -> bool {
        if self.disposed.replace(true) {
            return false;
        }

        for source in self.sources.take() {
            source.not_used_by(self.id);
        }
        // Drop captured state (sinks, buffers) now, not when the last handle goes.
        if let Ok(mut body) = self.body.try_borrow_mut() {
            body.take();
        }
        KEEP_ALIVE.with(|alive| alive.borrow_mut().retain(|e| e.id != self.id));
        true
    }
}

impl Observer for EffectInner {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn invalidate(self: Rc<Self>, queue: &mut Vec<Rc<EffectInner>>) {
        if self.disposed.get() || self.queued.replace(true) {
            return;
        }
        queue.push(self);
    }
}
