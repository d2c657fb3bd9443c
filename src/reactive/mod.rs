//! Reactive Primitives
//!
//! A small pull/push hybrid graph, owned by a single thread:
//!
//! ```text
//! Signal<T> --read--> Memo<T> --read--> Effect
//!     |                  ^                 ^
//!     +----- stale ------+----- queue -----+
//! ```
//!
//! - `Signal` - mutable cell, bumps its version and notifies on `set`
//! - `Memo` - lazily recomputed derivation, returns the same `Rc` until stale
//! - `Effect` - observer that re-runs when anything it read last time changed
//! - `Scope` - group of effects disposed together, exactly once
//!
//! Dependencies are tracked automatically: every `get` performed while a memo
//! or effect body runs becomes part of that node's upstream set for the next
//! run. Writes are pushed as "stale" marks; values are only pulled on read.
//!
//! All effects queued by one `Signal::set` run before `set` returns, so the
//! graph is settled whenever control goes back to the caller.

mod effect;
mod memo;
mod scope;
mod signal;
mod tracking;


use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

pub use effect::Effect;
pub use memo::Memo;
pub use scope::Scope;
pub use signal::Signal;

use effect::EffectInner;

/// Identity of a node in the graph (unique per process).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A node that can be read inside a tracked computation.
pub(crate) trait Source {
    fn node_id(&self) -> NodeId;

    /// `observer` started to depend on this node.
    fn used_by(&self, observer: Weak<dyn Observer>);

    /// The observer with `id` stopped depending on this node.
    fn not_used_by(&self, id: NodeId);
}

/// A node downstream of one or more sources.
pub(crate) trait Observer {
    fn node_id(&self) -> NodeId;

    /// An upstream value changed.
    ///
    /// Memos mark themselves stale and forward the mark; effects push
    /// themselves onto `queue` (at most once per flush).
    fn invalidate(self: Rc<Self>, queue: &mut Vec<Rc<EffectInner>>);
}

/// Downstream registrations of a source.
#[derive(Default)]
pub(crate) struct Subscribers {
    list: std::cell::RefCell<Vec<(NodeId, Weak<dyn Observer>)>>,
}

impl Subscribers {
    pub(crate) fn add(&self, observer: Weak<dyn Observer>) {
        let Some(id) = observer.upgrade().map(|o| o.node_id()) else {
            return;
        };
        let mut list = self.list.borrow_mut();
        if !list.iter().any(|(existing, _)| *existing == id) {
            list.push((id, observer));
        }
    }

    pub(crate) fn remove(&self, id: NodeId) {
        self.list.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    /// Live observers, in registration order. Dead entries are pruned.
    pub(crate) fn snapshot(&self) -> Vec<Rc<dyn Observer>> {
        let mut list = self.list.borrow_mut();
        list.retain(|(_, weak)| weak.strong_count() > 0);
        list.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.list
            .borrow()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }
}

/// Notify every observer of a changed source, then run queued effects.
pub(crate) fn propagate(subscribers: &Subscribers) {
    let mut queue = Vec::new();
    for observer in subscribers.snapshot() {
        observer.invalidate(&mut queue);
    }
    for effect in queue {
        effect.execute();
    }
}

/// Swap the upstream set of `observer` from `old` to `new`.
pub(crate) fn resubscribe(
    id: NodeId,
    observer: &Weak<dyn Observer>,
    old: Vec<Rc<dyn Source>>,
    new: &[Rc<dyn Source>],
) {
    for source in old {
        if !new.iter().any(|s| s.node_id() == source.node_id()) {
            source.not_used_by(id);
        }
    }
    for source in new {
        source.used_by(observer.clone());
    }
}
