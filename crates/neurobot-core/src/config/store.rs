//! Persisted generation config.

use super::generation::GenerationConfig;
use crate::error::{NeurobotError, Result};
use crate::storage::KeyValueStore;
use std::sync::{Arc, RwLock};

/// Storage key of the JSON-serialized [`GenerationConfig`].
pub const CONFIG_STORAGE_KEY: &str = "neurobot_config";

/// Holds the current [`GenerationConfig`] and mirrors it into a key-value store.
///
/// Loading never fails: a missing, unparsable or out-of-range blob is
/// downgraded to the defaults and only logged. Saving updates the in-memory
/// snapshot before touching storage, so a persistence failure never keeps a
/// change from taking effect for the rest of the process.
pub struct ConfigStore {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<GenerationConfig>,
}

impl ConfigStore {
    /// Creates a store holding the defaults. Call [`ConfigStore::load`] to
    /// restore the persisted value.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: RwLock::new(GenerationConfig::default()),
        }
    }

    /// Restores the persisted config, falling back to the defaults.
    pub fn load(&self) -> GenerationConfig {
        let config = self.read_persisted().unwrap_or_default();
        self.set_current(config.clone());
        config
    }

    /// Makes `config` current and persists it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` without changing anything if `config` fails
    /// validation. Otherwise returns the persistence error, if any; the
    /// in-memory update has already happened by then and is not rolled back.
    pub fn save(&self, config: GenerationConfig) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string(&config)?;
        self.set_current(config);
        self.store.set(CONFIG_STORAGE_KEY, &json)
    }

    /// Snapshot of the current config.
    pub fn current(&self) -> GenerationConfig {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_current(&self, config: GenerationConfig) {
        match self.current.write() {
            Ok(mut current) => *current = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    fn read_persisted(&self) -> Option<GenerationConfig> {
        let raw = match self.store.get(CONFIG_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("[ConfigStore] No persisted config, using defaults");
                return None;
            }
            Err(e) => {
                tracing::warn!("[ConfigStore] Failed to read persisted config: {}", e);
                return None;
            }
        };

        let parsed = serde_json::from_str::<GenerationConfig>(&raw)
            .map_err(NeurobotError::from)
            .and_then(|config| config.validate().map(|_| config));

        match parsed {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("[ConfigStore] Failed to parse config, using defaults: {}", e);
                None
            }
        }
    }
}
