//! Generation config persistence over the file-backed store.

use neurobot_core::config::CONFIG_STORAGE_KEY;
use neurobot_core::{ConfigStore, GenerationConfig, KeyValueStore, ModelName};
use neurobot_infrastructure::{FileKeyValueStore, NeurobotPaths};
use std::sync::Arc;
use tempfile::TempDir;

fn store_in(temp_dir: &TempDir) -> Arc<FileKeyValueStore> {
    let paths = NeurobotPaths::new(Some(temp_dir.path()));
    Arc::new(FileKeyValueStore::new(paths.storage_file().unwrap()))
}

#[test]
fn test_saved_config_is_restored_by_a_new_process() {
    let temp_dir = TempDir::new().unwrap();

    let config = GenerationConfig::default()
        .with_model(ModelName::Gemini25FlashLite)
        .with_system_instruction("Be brief.")
        .with_temperature(1.3)
        .unwrap()
        .with_system_active(false);

    let first = ConfigStore::new(store_in(&temp_dir));
    first.load();
    first.save(config.clone()).unwrap();

    let second = ConfigStore::new(store_in(&temp_dir));
    assert_eq!(second.load(), config);
    assert_eq!(second.current(), config);
}

#[test]
fn test_corrupted_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let kv = store_in(&temp_dir);
    kv.set(CONFIG_STORAGE_KEY, "{\"temperature\": \"hot\"").unwrap();

    let store = ConfigStore::new(kv.clone());
    assert_eq!(store.load(), GenerationConfig::default());

    // The next save repairs the stored value
    store.save(GenerationConfig::default().with_system_active(false)).unwrap();
    let raw = kv.get(CONFIG_STORAGE_KEY).unwrap().unwrap();
    let restored: GenerationConfig = serde_json::from_str(&raw).unwrap();
    assert!(!restored.is_system_active);
}

#[test]
fn test_unreadable_store_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let paths = NeurobotPaths::new(Some(temp_dir.path()));
    std::fs::write(paths.storage_file().unwrap(), "not json at all").unwrap();

    let store = ConfigStore::new(store_in(&temp_dir));
    assert_eq!(store.load(), GenerationConfig::default());
}
