//! Streaming capability of the model provider.
//!
//! The provider is an external collaborator: it receives the whole replayed
//! history plus the new message on every turn and answers with a stream of
//! text deltas. No session state is kept on its side.

use crate::conversation::Sender;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Stream of incremental text deltas, terminated by stream completion.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Role tag of a replayed history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl From<Sender> for Role {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => Role::User,
            Sender::Model => Role::Model,
        }
    }
}

/// A text fragment of a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One role-tagged record of the replayed history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl HistoryEntry {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Provider-agnostic request built fresh for every turn.
///
/// `history` is the conversation as it stood before the new user turn;
/// `message` is the new user turn itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub model: String,
    pub history: Vec<HistoryEntry>,
    pub system_instruction: String,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub message: String,
}

/// A model provider able to stream a reply to a [`SessionRequest`].
#[async_trait]
pub trait StreamingProvider: Send + Sync {
    /// Issues the request and returns the stream of text deltas.
    ///
    /// # Errors
    ///
    /// Returns `Provider` or `Transport` errors when the request cannot be
    /// started. Errors after that point arrive as items of the stream.
    async fn open_stream(&self, request: &SessionRequest) -> Result<TextStream>;
}
