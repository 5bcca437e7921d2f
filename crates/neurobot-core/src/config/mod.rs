//! Configuration module.
//!
//! - `generation`: per-turn generation parameters and the maintenance flag
//! - `model_name`: the enumerated model choices
//! - `store`: persistence of the generation config through a key-value store
//! - `settings`: read-only process settings (credentials, admin code, texts)

mod generation;
mod model_name;
mod settings;
mod store;

pub use generation::{
    DEFAULT_SYSTEM_INSTRUCTION, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
    GenerationConfig, MAX_TEMPERATURE,
};
pub use model_name::ModelName;
pub use settings::{AppSettings, DEFAULT_API_BASE_URL, DEFAULT_ERROR_MESSAGE, DEFAULT_GREETING};
pub use store::{CONFIG_STORAGE_KEY, ConfigStore};
