//! Settings service implementation.
//!
//! Loads [`AppSettings`] from `settings.toml` and applies environment
//! overrides on top.

use crate::paths::NeurobotPaths;
use neurobot_core::{AppSettings, NeurobotError, Result};
use std::path::{Path, PathBuf};

/// Environment variable holding the provider API key.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
/// Fallback variable for the API key.
pub const ENV_API_KEY_FALLBACK: &str = "API_KEY";
/// Environment variable holding the administrator code.
pub const ENV_ADMIN_CODE: &str = "NEUROBOT_ADMIN_CODE";

/// Loads application settings once at startup.
///
/// The settings file is optional. The environment always wins over the
/// file; empty variables are ignored.
#[derive(Debug, Clone)]
pub struct SettingsService {
    path: PathBuf,
}

impl SettingsService {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a service reading the settings file under `paths`.
    pub fn from_paths(paths: &NeurobotPaths) -> Result<Self> {
        let path = paths
            .settings_file()
            .map_err(|e| NeurobotError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file and applies overrides from the process environment.
    pub fn load(&self) -> Result<AppSettings> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Reads the file and applies overrides from `env`.
    ///
    /// # Errors
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// read or parsed is an error, so a typo never silently drops the key.
    pub fn load_with_env<F>(&self, env: F) -> Result<AppSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = self.read_file()?;

        let non_empty = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY).or_else(|| non_empty(ENV_API_KEY_FALLBACK)) {
            tracing::debug!("[SettingsService] API key taken from the environment");
            settings.api_key = Some(key);
        }
        if let Some(code) = non_empty(ENV_ADMIN_CODE) {
            tracing::debug!("[SettingsService] Admin code taken from the environment");
            settings.admin_code = Some(code);
        }

        Ok(settings)
    }

    fn read_file(&self) -> Result<AppSettings> {
        if !self.path.exists() {
            tracing::info!(
                "[SettingsService] No settings file at {:?}, using defaults",
                self.path
            );
            return Ok(AppSettings::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            NeurobotError::config(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().join("settings.toml"));

        let settings = service.load_with_env(env_of(&[])).unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_environment_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "api_key = \"from-file\"\nadmin_code = \"file-code\"\ngreeting = \"Hi\"\n",
        )
        .unwrap();
        let service = SettingsService::new(path);

        let settings = service
            .load_with_env(env_of(&[(ENV_API_KEY, "from-env"), (ENV_ADMIN_CODE, "env-code")]))
            .unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("from-env"));
        assert_eq!(settings.admin_code.as_deref(), Some("env-code"));
        assert_eq!(settings.greeting, "Hi");
    }

    #[test]
    fn test_api_key_fallback_and_empty_values() {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().join("settings.toml"));

        let settings = service
            .load_with_env(env_of(&[
                (ENV_API_KEY, "  "),
                (ENV_API_KEY_FALLBACK, "fallback"),
                (ENV_ADMIN_CODE, ""),
            ]))
            .unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("fallback"));
        assert!(settings.admin_code.is_none());
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        std::fs::write(&path, "api_key = ").unwrap();

        let err = SettingsService::new(path)
            .load_with_env(env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, NeurobotError::Config(_)));
    }
}
