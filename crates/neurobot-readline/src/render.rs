//! Turns chat events into terminal output for the reply being streamed.

use neurobot_application::ChatEvent;
use neurobot_core::{Sender, TurnId};

/// What the terminal should print for one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// A reply begins; print the bot prefix.
    ReplyStart,
    /// New text at the end of the reply.
    Delta(String),
    /// The reply was changed by someone else; reprint it whole.
    Rewrite(String),
    /// The reply failed; print the error turn.
    Error(String),
    /// The reply was deleted while streaming.
    Removed,
    /// The request is over.
    ReplyEnd,
}

/// Tracks the reply being streamed so only new suffixes are printed.
#[derive(Debug, Default)]
pub struct StreamRenderer {
    current: Option<TurnId>,
    printed: String,
    streaming: bool,
}

impl StreamRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ChatEvent) -> Option<Output> {
        match event {
            ChatEvent::RequestStarted => {
                self.streaming = true;
                None
            }
            ChatEvent::TurnAppended(turn) if turn.is_placeholder() => {
                self.current = Some(turn.id.clone());
                self.printed.clear();
                Some(Output::ReplyStart)
            }
            // Error turn appended because the placeholder was already gone
            ChatEvent::TurnAppended(turn) if self.streaming && turn.sender == Sender::Model => {
                Some(Output::Error(turn.text.clone()))
            }
            ChatEvent::TurnUpdated { id, text } if self.is_current(id) => {
                if let Some(delta) = text.strip_prefix(self.printed.as_str()) {
                    let delta = delta.to_string();
                    self.printed = text.clone();
                    (!delta.is_empty()).then_some(Output::Delta(delta))
                } else {
                    self.printed = text.clone();
                    Some(Output::Rewrite(text.clone()))
                }
            }
            ChatEvent::TurnReplaced { id, turn } if self.is_current(id) => {
                self.current = None;
                Some(Output::Error(turn.text.clone()))
            }
            ChatEvent::TurnRemoved { id } if self.is_current(id) => {
                self.current = None;
                Some(Output::Removed)
            }
            ChatEvent::RequestFinished => {
                self.streaming = false;
                self.current = None;
                self.printed.clear();
                Some(Output::ReplyEnd)
            }
            _ => None,
        }
    }

    fn is_current(&self, id: &TurnId) -> bool {
        self.current.as_ref() == Some(id)
    }
}
