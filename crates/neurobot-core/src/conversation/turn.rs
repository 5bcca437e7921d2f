//! Conversation turn types.
//!
//! This module contains the single unit of a conversation: who said it,
//! what was said, and when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Represents the author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Turn typed by the person at the keyboard.
    User,
    /// Turn produced by the language model.
    Model,
}

/// Unique identifier of a turn.
///
/// New ids are UUIDv7, so they also sort by creation time; ordering inside
/// a conversation is still defined by log position only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(String);

impl TurnId {
    /// Generates a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TurnId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TurnId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single turn in a conversation.
///
/// Only `text` changes after creation: streaming fills a placeholder, and an
/// administrator may edit any turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Unique identifier within the log.
    pub id: TurnId,
    /// Author of the turn.
    pub sender: Sender,
    /// Current text of the turn.
    pub text: String,
    /// When the turn was created.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn with a freshly generated id.
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: TurnId::generate(),
            sender,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Sender::Model, text)
    }

    /// Creates the empty model turn that a streamed response is folded into.
    pub fn placeholder() -> Self {
        Self::new(Sender::Model, String::new())
    }

    /// A model turn that has not received any text yet.
    pub fn is_placeholder(&self) -> bool {
        self.sender == Sender::Model && self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Sender::Model).unwrap(), "\"model\"");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Turn::user("one");
        let b = Turn::user("one");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_placeholder() {
        let turn = Turn::placeholder();
        assert!(turn.is_placeholder());
        assert_eq!(turn.sender, Sender::Model);

        // An empty user turn is not a placeholder
        assert!(!Turn::user("").is_placeholder());
    }

    #[test]
    fn test_turn_serializes_with_lowercase_sender() {
        let turn = Turn {
            id: TurnId::from("init-1"),
            sender: Sender::Model,
            text: "Hello".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["id"], "init-1");
        assert_eq!(json["sender"], "model");
        assert!(json.get("createdAt").is_some());
    }
}
