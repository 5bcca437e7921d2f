//! Key-value persistence capability.

use crate::error::{NeurobotError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// A string-keyed get/set store.
///
/// This is the only persistence NEUROBOT needs: one JSON blob for the
/// generation config. Calls are synchronous; implementations decide where
/// the data lives (a file, memory, ...).
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Value found
    /// - `Ok(None)`: Nothing stored under this key
    /// - `Err(_)`: The backing store could not be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Volatile store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| NeurobotError::internal("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| NeurobotError::internal("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| NeurobotError::internal("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}
