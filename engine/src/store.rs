//! Tiny key/value store for the persisted debugger flag.
//!
//! The only thing ever stored is `lostpage-debug-mode = "true"`. The file
//! backend keeps a flat JSON object on disk:
//!
//! ```text
//! ~/.local/share/lostpage/storage.json
//! { "lostpage-debug-mode": "true" }
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Errors from the flag store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("could not determine a data directory for {0}")]
    NoDataDir(&'static str),
}

/// String key/value storage with `localStorage` semantics.
pub trait FlagStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same entries, so a "remount" can be
/// simulated by building a second consumer from a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryFlagStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// JSON-file store written atomically through a `.tmp` sibling.
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    /// Default location under the XDG data directory.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        dirs::data_dir()
            .map(|dir| dir.join("lostpage").join("storage.json"))
            .ok_or(StoreError::NoDataDir("storage.json"))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut entries) => entries.remove(key),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "unreadable flag store: {err}");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn memory_clones_share_entries() {
        let mut a = MemoryFlagStore::default();
        let b = a.clone();
        a.set("k", "v").expect("set");
        assert_eq!(b.get("k"), Some("v".to_string()));
        a.remove("k").expect("remove");
        assert_eq!(b.get("k"), None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("storage.json");
        let mut store = FileFlagStore::new(&path);
        assert_eq!(store.get("k"), None);

        store.set("k", "true").expect("set");
        assert_eq!(FileFlagStore::new(&path).get("k"), Some("true".to_string()));
        assert!(!path.with_extension("tmp").exists());

        store.remove("k").expect("remove");
        let raw = std::fs::read_to_string(&path).expect("read");
        assert_eq!(raw.trim(), "{}");
    }

    #[test]
    fn corrupt_file_reads_as_absent() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").expect("write");
        let mut store = FileFlagStore::new(&path);
        assert_eq!(store.get("k"), None);
        assert!(matches!(store.set("k", "v"), Err(StoreError::Serde(_))));
    }
}
