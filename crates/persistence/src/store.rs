//! Durable key/value blob storage behind the save gateway.

use crate::PersistenceError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Read/write a single named blob per key.
pub trait SaveStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;

    fn contains(&self, key: &str) -> Result<bool, PersistenceError> {
        Ok(self.read(key)?.is_some())
    }
}

impl<S: SaveStore + ?Sized> SaveStore for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        (**self).write(key, blob)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }

    fn contains(&self, key: &str) -> Result<bool, PersistenceError> {
        (**self).contains(key)
    }
}

/// One `<key>.json` file per blob under a root directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl SaveStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;
        // Write-then-rename: readers never observe a partial blob.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, PersistenceError> {
        Ok(self.path_for(key)?.exists())
    }
}

/// In-process store, used by tests and headless simulations.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.blobs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir(tag: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("pg-persistence-{}-{tag}-{n}", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut s = MemoryStore::new();
        assert_eq!(s.read("k").unwrap(), None);
        s.write("k", "blob").unwrap();
        assert!(s.contains("k").unwrap());
        assert_eq!(s.read("k").unwrap().as_deref(), Some("blob"));
        s.remove("k").unwrap();
        assert!(!s.contains("k").unwrap());
    }

    #[test]
    fn file_store_writes_and_removes() {
        let dir = scratch_dir("file-store");
        let mut s = FileStore::new(&dir);
        assert!(!s.contains("save").unwrap());
        s.write("save", "{}").unwrap();
        assert!(dir.join("save.json").exists());
        assert!(!dir.join("save.json.tmp").exists());
        assert_eq!(s.read("save").unwrap().as_deref(), Some("{}"));
        s.remove("save").unwrap();
        assert_eq!(s.read("save").unwrap(), None);
        // removing twice is fine
        s.remove("save").unwrap();
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let mut s = FileStore::new(scratch_dir("keys"));
        assert!(matches!(
            s.write("../escape", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
        assert!(matches!(s.read(""), Err(PersistenceError::InvalidKey(_))));
    }
}
