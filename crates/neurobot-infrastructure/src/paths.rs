//! Unified path management for NEUROBOT files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/neurobot/          # Config directory (platform equivalent)
//! ├── settings.toml            # API key, admin code, texts
//! ├── storage.json             # Key-value store (generation config)
//! └── logs/                    # Application logs
//!     └── neurobot.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "neurobot";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves every NEUROBOT path from one base directory.
///
/// Without an explicit base the platform config directory is used
/// (`$XDG_CONFIG_HOME/neurobot` on Linux).
#[derive(Debug, Clone)]
pub struct NeurobotPaths {
    base: Option<PathBuf>,
}

const SETTINGS_TEMPLATE: &str = r#"# NEUROBOT settings
#
# The Gemini API key. GEMINI_API_KEY (or API_KEY) in the environment takes precedence.
# api_key = ""
#
# Code that unlocks administrator mode. NEUROBOT_ADMIN_CODE takes precedence.
# This is a convenience lock, not real access control.
# admin_code = ""
#
# api_base_url = "https://generativelanguage.googleapis.com/v1beta"
# greeting = "Hello! I'm NEUROBOT. How can I help you today?"
# error_message = "Sorry, an error occurred while connecting to the server."
# request_timeout_secs = 120
"#;

impl NeurobotPaths {
    /// Creates a resolver rooted at `base`, or at the platform config
    /// directory when `base` is `None`.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the NEUROBOT configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    /// Returns the path to `settings.toml`.
    pub fn settings_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("settings.toml"))
    }

    /// Returns the path to the key-value store file.
    pub fn storage_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("storage.json"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }

    /// Ensures the settings file exists, creating a commented template if it doesn't.
    ///
    /// # Security Note
    ///
    /// The file may hold the API key and the admin code, so it is created
    /// with permissions 600 on Unix systems.
    pub fn ensure_settings_file(&self) -> Result<PathBuf, std::io::Error> {
        let settings_path = self
            .settings_file()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;

        if settings_path.exists() {
            return Ok(settings_path);
        }

        if let Some(parent) = settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&settings_path, SETTINGS_TEMPLATE)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&settings_path, permissions)?;
        }

        tracing::info!("[Paths] Created settings template at {:?}", settings_path);
        Ok(settings_path)
    }
}
