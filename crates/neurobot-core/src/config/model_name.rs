//! Models offered in the administrator settings.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// The enumerated set of selectable models.
///
/// `GenerationConfig` stores the model as a plain string so a persisted
/// value naming some other model survives a round trip; this enum is what the
/// settings surface offers.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
pub enum ModelName {
    #[default]
    #[strum(serialize = "gemini-2.5-flash")]
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,
    #[strum(serialize = "gemini-3-pro-preview")]
    #[serde(rename = "gemini-3-pro-preview")]
    Gemini3ProPreview,
    #[strum(serialize = "gemini-2.5-flash-lite-latest")]
    #[serde(rename = "gemini-2.5-flash-lite-latest")]
    Gemini25FlashLite,
}

impl ModelName {
    /// Human-readable label shown next to the model id.
    pub fn label(&self) -> &'static str {
        match self {
            ModelName::Gemini25Flash => "Gemini 2.5 Flash (recommended)",
            ModelName::Gemini3ProPreview => "Gemini 3 Pro (maximum intelligence)",
            ModelName::Gemini25FlashLite => "Gemini Flash Lite (fast)",
        }
    }

    /// All selectable models, in menu order.
    pub fn all() -> Vec<ModelName> {
        ModelName::iter().collect()
    }
}
