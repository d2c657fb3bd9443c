//! Backing storage for documents.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::core::{DocumentName, LiveError};

/// Reads the current markup of a named document.
pub trait PageStore: Send + Sync {
    fn read(&self, name: &DocumentName) -> Result<String, LiveError>;
}

/// Documents are files directly inside one directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PageStore for FsStore {
    fn read(&self, name: &DocumentName) -> Result<String, LiveError> {
        let path = name.path_in(&self.dir);
        let content = fs::read(&path).map_err(|source| unavailable(name, source))?;
        String::from_utf8(content).map_err(|e| {
            unavailable(name, io::Error::new(io::ErrorKind::InvalidData, e))
        })
    }
}

fn unavailable(name: &DocumentName, source: io::Error) -> LiveError {
    LiveError::SourceUnavailable {
        name: name.clone(),
        source,
    }
}

#[cfg(test)]
pub use memory::MemoryStore;

#[cfg(test)]
mod memory {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;

    use super::*;

    /// In-memory store that counts reads.
    #[derive(Default)]
    pub struct MemoryStore {
        pages: Mutex<FxHashMap<String, String>>,
        reads: AtomicUsize,
    }

    impl MemoryStore {
        pub fn with(pages: &[(&str, &str)]) -> Self {
            let store = Self::default();
            for (name, content) in pages {
                store.put(name, content);
            }
            store
        }

        pub fn put(&self, name: &str, content: &str) {
            self.pages.lock().insert(name.to_string(), content.to_string());
        }

        pub fn remove(&self, name: &str) {
            self.pages.lock().remove(name);
        }

        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl PageStore for MemoryStore {
        fn read(&self, name: &DocumentName) -> Result<String, LiveError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.pages.lock().get(name.as_str()).cloned().ok_or_else(|| {
                unavailable(name, io::Error::new(io::ErrorKind::NotFound, "no such page"))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_store_reads_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), "<p>a</p>").unwrap();

        let store = FsStore::new(dir.path());
        let name = DocumentName::parse("a.html").unwrap();
        assert_eq!(store.read(&name).unwrap(), "<p>a</p>");
    }

    #[test]
    fn test_fs_store_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        let name = DocumentName::parse("missing.html").unwrap();

        let err = store.read(&name).unwrap_err();
        assert!(matches!(err, LiveError::SourceUnavailable { .. }));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_fs_store_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bin.html"), [0xff, 0xfe, 0x00]).unwrap();

        let store = FsStore::new(dir.path());
        let name = DocumentName::parse("bin.html").unwrap();
        assert!(matches!(
            store.read(&name),
            Err(LiveError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_memory_store_counts_reads() {
        let store = MemoryStore::with(&[("a.html", "x")]);
        let name = DocumentName::parse("a.html").unwrap();
        store.read(&name).unwrap();
        store.read(&name).unwrap();
        assert_eq!(store.reads(), 2);
    }
}
