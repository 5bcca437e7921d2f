//! Process-wide application settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GREETING: &str = "Hello! I'm NEUROBOT. How can I help you today?";
pub const DEFAULT_ERROR_MESSAGE: &str = "Sorry, an error occurred while connecting to the server.";

/// Settings read once at startup and never changed at runtime.
///
/// Unlike [`super::GenerationConfig`], these are not editable from the
/// administrator panel. They hold the provider credentials and the static
/// administrator code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Provider API key.
    pub api_key: Option<String>,
    /// Static shared secret that unlocks administrator mode.
    pub admin_code: Option<String>,
    /// Base URL of the provider REST API.
    pub api_base_url: String,
    /// File backing the key-value store. `None` selects the default location.
    pub storage_file: Option<PathBuf>,
    /// Model turn shown when the conversation starts. Empty disables it.
    pub greeting: String,
    /// Fixed text of the turn that replaces a failed response.
    pub error_message: String,
    /// Overall HTTP timeout. No timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            admin_code: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage_file: None,
            greeting: DEFAULT_GREETING.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            request_timeout_secs: None,
        }
    }
}
