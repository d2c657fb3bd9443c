//! One reactive observation per open connection.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::registry::Entry;
use crate::core::DocumentName;
use crate::dom::Document;
use crate::reactive::Scope;
use crate::stream::{Fragment, PushSink};

/// Identity of one subscription (one viewer connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[cfg(test)]
impl SubscriptionId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Subscription {
    name: DocumentName,
    scope: Scope,
    sink: Rc<dyn PushSink>,
}

/// Open subscriptions, each owning the scope of its effect.
#[derive(Default)]
pub struct Subscriptions {
    next: u64,
    active: FxHashMap<SubscriptionId, Subscription>,
    /// Subscriptions whose sink refused a push, awaiting teardown.
    faulted: Rc<RefCell<Vec<SubscriptionId>>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start pushing `entry`'s document to `sink`.
    ///
    /// The current document is pushed before this returns. Afterwards every
    /// recomputed document is pushed once, in order.
    pub fn open(
        &mut self,
        name: DocumentName,
        entry: &Entry,
        sink: Rc<dyn PushSink>,
    ) -> SubscriptionId {
        self.next += 1;
        let id = SubscriptionId(self.next);

        let scope = Scope::new();
        let dom = entry.dom().clone();
        let faulted = Rc::clone(&self.faulted);
        let target = Rc::clone(&sink);
        let mut last: Option<Rc<Document>> = None;

        scope.effect(move || {
            let doc = dom.get();
            if last.as_ref().is_some_and(|prev| Rc::ptr_eq(prev, &doc)) {
                return;
            }
            match target.push(Fragment::merge(doc.outer_html())) {
                Ok(()) => last = Some(doc),
                Err(_) => faulted.borrow_mut().push(id),
            }
        });

        self.active.insert(id, Subscription { name, scope, sink });
        id
    }

    /// Dispose a subscription. Returns `false` if it was already closed.
    pub fn close(&mut self, id: SubscriptionId) -> bool {
        let Some(subscription) = self.active.remove(&id) else {
            return false;
        };
        subscription.scope.dispose();
        subscription.sink.close();
        true
    }

    /// Close every subscription whose sink failed since the last call.
    pub fn reap_faulted(&mut self) -> Vec<SubscriptionId> {
        let faulted = std::mem::take(&mut *self.faulted.borrow_mut());
        faulted.into_iter().filter(|id| self.close(*id)).collect()
    }

    /// Close everything, e.g. on shutdown.
    pub fn close_all(&mut self) -> usize {
        let ids: Vec<_> = self.active.keys().copied().collect();
        ids.into_iter().filter(|id| self.close(*id)).count()
    }

    #[cfg(test)]
    pub fn name_of(&self, id: SubscriptionId) -> Option<&DocumentName> {
        self.active.get(&id).map(|s| &s.name)
    }

    #[cfg(test)]
    pub fn is_open(&self, id: SubscriptionId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.active.len()
    }

    /// Open subscriptions watching `name`.
    pub fn count_for(&self, name: &DocumentName) -> usize {
        self.active.values().filter(|s| &s.name == name).count()
    }
}
