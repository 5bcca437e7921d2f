//! File-system adapters for NEUROBOT: paths, settings and the key-value store.

pub mod paths;
pub mod settings_service;
pub mod storage;

pub use crate::paths::{NeurobotPaths, PathError};
pub use crate::settings_service::SettingsService;
pub use crate::storage::FileKeyValueStore;
