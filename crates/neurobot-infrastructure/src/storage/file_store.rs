//! File-backed key-value store.
//!
//! The whole store is one flat JSON object on disk. Reads parse the file
//! directly; writes run under an exclusive `fs2` lock on a sibling
//! `.lock` file and replace the document through a temp file and rename.

use fs2::FileExt;
use neurobot_core::{KeyValueStore, NeurobotError, Result};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

type Entries = BTreeMap<String, String>;

/// [`KeyValueStore`] persisted as one JSON document. Nothing is cached.
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        tracing::debug!("[FileKeyValueStore] Using {:?}", path);
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or blank file reads as `None`.
    fn read_entries(&self) -> Result<Option<Entries>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.sibling(".tmp")?;

        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(json.as_bytes())?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// `.storage.json.tmp`, `.storage.json.lock`, ... next to the store.
    fn sibling(&self, suffix: &str) -> Result<PathBuf> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| NeurobotError::storage(format!("{:?} is not a file path", self.path)))?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join(format!(".{}{}", name.to_string_lossy(), suffix)))
    }

    /// Read-modify-write under the store lock.
    ///
    /// With `reset_corrupt`, an unparsable document is replaced instead of
    /// failing the write.
    fn modify<F>(&self, reset_corrupt: bool, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Entries),
    {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.sibling(".lock")?)?;
        lock.lock_exclusive()
            .map_err(|e| NeurobotError::storage(format!("cannot lock {:?}: {}", self.path, e)))?;

        let mut entries = match self.read_entries() {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) if reset_corrupt && e.is_serialization() => {
                tracing::warn!(
                    "[FileKeyValueStore] Replacing unreadable store {:?}: {}",
                    self.path,
                    e
                );
                Entries::new()
            }
            Err(e) => return Err(e),
        };
        edit(&mut entries);
        self.write_entries(&entries)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.read_entries()?.unwrap_or_default();
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(true, |entries| {
            entries.insert(key.to_string(), value.to_string());
        })?;
        tracing::debug!("[FileKeyValueStore] Stored key '{}'", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(false, |entries| {
            entries.remove(key);
        })
    }
}
