//! NEUROBOT core: conversation model and session orchestration.
//!
//! Everything here is free of I/O. Persistence and the model provider are
//! reached through the [`storage::KeyValueStore`] and
//! [`provider::StreamingProvider`] capabilities, which the infrastructure and
//! interaction crates implement.

pub mod access;
pub mod config;
pub mod conversation;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod storage;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use access::{AccessGate, Clearance};
pub use config::{AppSettings, ConfigStore, GenerationConfig, ModelName};
pub use conversation::{ConversationLog, Sender, Turn, TurnId};
pub use error::{NeurobotError, Result};
pub use orchestrator::SessionOrchestrator;
pub use provider::{SessionRequest, StreamingProvider, TextStream};
pub use storage::{KeyValueStore, MemoryKeyValueStore};
