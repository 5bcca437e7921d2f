//! Application layer for NEUROBOT.
//!
//! This crate provides the chat use case that coordinates the conversation
//! log, the persisted config, the access gate and the provider.

pub mod chat_session;

pub use chat_session::{ChatEvent, ChatSession, SubmitOutcome};
