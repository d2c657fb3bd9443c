//! Per-document reactive state, keyed by name.

use std::collections::hash_map::Entry as MapEntry;

use rustc_hash::FxHashMap;

use super::annotate::annotate;
use crate::core::{DocumentName, LiveError};
use crate::dom::Document;
use crate::reactive::{Memo, Signal};

/// Raw markup cell and its derived document.
#[derive(Clone)]
pub struct Entry {
    cell: Signal<String>,
    dom: Memo<Document>,
}

impl Entry {
    fn new(content: String) -> Self {
        let cell = Signal::new(content);
        let source = cell.clone();
        let dom = Memo::new(move || annotate(&source.read()));
        Self { cell, dom }
    }

    #[cfg(test)]
    pub fn cell(&self) -> &Signal<String> {
        &self.cell
    }

    pub fn dom(&self) -> &Memo<Document> {
        &self.dom
    }
}

/// Registry of watched documents.
///
/// Entries are created on first access and never removed.
#[derive(Default)]
pub struct Registry {
    entries: FxHashMap<DocumentName, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `name`, creating it from `load` on first access.
    ///
    /// `load` runs only when the entry is missing. Returns the entry and
    /// whether it was created by this call.
    pub fn ensure(
        &mut self,
        name: &DocumentName,
        load: impl FnOnce() -> Result<String, LiveError>,
    ) -> Result<(&Entry, bool), LiveError> {
        match self.entries.entry(name.clone()) {
            MapEntry::Occupied(entry) => Ok((entry.into_mut(), false)),
            MapEntry::Vacant(slot) => {
                let content = load()?;
                Ok((slot.insert(Entry::new(content)), true))
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &DocumentName) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Replace the raw markup of `name`. Returns `false` for unknown names.
    ///
    /// Every observer of the document has run by the time this returns.
    pub fn write(&self, name: &DocumentName, content: String) -> bool {
        match self.entries.get(name) {
            Some(entry) => {
                entry.cell.set(content);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &DocumentName) -> bool {
        self.entries.contains_key(name)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
