//! Composition root: wires settings, storage, provider and session together.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use neurobot_application::{ChatEvent, ChatSession};
use neurobot_core::config::CONFIG_STORAGE_KEY;
use neurobot_core::{
    AccessGate, AppSettings, ConfigStore, ConversationLog, KeyValueStore, MemoryKeyValueStore,
    ModelName, SessionOrchestrator,
};
use neurobot_infrastructure::{FileKeyValueStore, NeurobotPaths, SettingsService};
use neurobot_interaction::GeminiStreamProvider;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Startup options taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    pub settings: Option<PathBuf>,
    pub storage: Option<PathBuf>,
    pub model: Option<ModelName>,
}

/// Everything the REPL needs.
pub struct AppBootstrap {
    pub chat: Arc<ChatSession>,
    pub events: UnboundedReceiver<ChatEvent>,
}

impl AppBootstrap {
    pub fn build(options: &BootstrapOptions, paths: &NeurobotPaths) -> Result<Self> {
        let settings = load_settings(options, paths)?;

        let store = open_store(options, &settings, paths);
        let config_store = Arc::new(ConfigStore::new(store));
        let config = config_store.load();
        tracing::info!(
            "[Bootstrap] Generation config loaded: model={}, active={}",
            config.model_name,
            config.is_system_active
        );

        if let Some(model) = options.model {
            tracing::info!("[Bootstrap] Model overridden from the command line: {}", model);
            if let Err(e) = config_store.save(config.with_model(model)) {
                tracing::warn!("[Bootstrap] Model override not persisted: {}", e);
            }
        }

        if settings.admin_code.is_none() {
            tracing::warn!("[Bootstrap] No admin code configured, administrator mode is unavailable");
        }
        let access_gate = Arc::new(AccessGate::from_secret(settings.admin_code.clone()));

        let provider = GeminiStreamProvider::from_settings(&settings)
            .context("Cannot create the Gemini provider")?;
        let orchestrator = SessionOrchestrator::new(Arc::new(provider));

        let (tx, events) = mpsc::unbounded_channel();
        let chat = ChatSession::new(
            ConversationLog::with_greeting(&settings.greeting),
            config_store,
            access_gate,
            orchestrator,
            settings.error_message.clone(),
        )
        .with_event_sender(tx);

        tracing::info!("[Bootstrap] Chat session ready");
        Ok(Self {
            chat: Arc::new(chat),
            events,
        })
    }
}

fn load_settings(options: &BootstrapOptions, paths: &NeurobotPaths) -> Result<AppSettings> {
    let service = match &options.settings {
        Some(path) => SettingsService::new(path.clone()),
        None => {
            if let Err(e) = paths.ensure_settings_file() {
                tracing::warn!("[Bootstrap] Could not create settings template: {}", e);
            }
            SettingsService::from_paths(paths)?
        }
    };

    tracing::info!("[Bootstrap] Loading settings from {:?}", service.path());
    Ok(service.load()?)
}

/// Opens the file-backed store, or a volatile one if the file is unusable.
fn open_store(
    options: &BootstrapOptions,
    settings: &AppSettings,
    paths: &NeurobotPaths,
) -> Arc<dyn KeyValueStore> {
    let path = match options
        .storage
        .clone()
        .or_else(|| settings.storage_file.clone())
        .map(Ok)
        .unwrap_or_else(|| paths.storage_file())
    {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("[Bootstrap] No storage location ({}), settings will not persist", e);
            return Arc::new(MemoryKeyValueStore::new());
        }
    };

    let store = FileKeyValueStore::new(path);
    match store.get(CONFIG_STORAGE_KEY) {
        Err(e) if e.is_storage() => {
            tracing::warn!(
                "[Bootstrap] Storage file {:?} unusable ({}), settings will not persist",
                store.path(),
                e
            );
            Arc::new(MemoryKeyValueStore::new())
        }
        _ => Arc::new(store),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurobot_core::Sender;
    use tempfile::TempDir;

    fn write_settings(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_build_wires_greeting_and_model_override() {
        let temp_dir = TempDir::new().unwrap();
        let options = BootstrapOptions {
            settings: Some(write_settings(
                &temp_dir,
                "api_key = \"test-key\"\ngreeting = \"Welcome!\"\n",
            )),
            storage: Some(temp_dir.path().join("storage.json")),
            model: Some(ModelName::Gemini3ProPreview),
        };
        let paths = NeurobotPaths::new(Some(temp_dir.path()));

        let app = AppBootstrap::build(&options, &paths).unwrap();

        let turns = app.chat.turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].sender, Sender::Model);
        assert_eq!(turns[0].text, "Welcome!");
        assert_eq!(app.chat.config().model_name, "gemini-3-pro-preview");
        assert!(temp_dir.path().join("storage.json").exists());
    }

    #[test]
    fn test_empty_greeting_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let options = BootstrapOptions {
            settings: Some(write_settings(&temp_dir, "api_key = \"k\"\ngreeting = \"\"\n")),
            storage: Some(temp_dir.path().join("storage.json")),
            model: None,
        };
        let paths = NeurobotPaths::new(Some(temp_dir.path()));

        let app = AppBootstrap::build(&options, &paths).unwrap();
        assert!(app.chat.turns().is_empty());
        assert!(!app.chat.clearance().is_admin());
    }

    #[test]
    fn test_corrupted_storage_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let storage = temp_dir.path().join("storage.json");
        std::fs::write(&storage, "{{{").unwrap();
        let options = BootstrapOptions {
            settings: Some(write_settings(&temp_dir, "api_key = \"k\"\n")),
            storage: Some(storage),
            model: None,
        };
        let paths = NeurobotPaths::new(Some(temp_dir.path()));

        let app = AppBootstrap::build(&options, &paths).unwrap();
        assert_eq!(app.chat.config(), neurobot_core::GenerationConfig::default());
    }
}
