//! Chat session use case.
//!
//! Implements the two-phase send protocol on top of [`SessionOrchestrator`]:
//!
//! 1. Synchronously append the user turn and an empty model placeholder.
//! 2. Stream the reply into the placeholder, addressed by its id, so that
//!    administrator edits and deletions made in between are respected.
//!
//! On failure the placeholder is swapped for a turn carrying the fixed
//! error text. Only one send may be in flight at a time.

use neurobot_core::{
    AccessGate, Clearance, ConfigStore, ConversationLog, GenerationConfig, NeurobotError, Result,
    SessionOrchestrator, Turn, TurnId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc::UnboundedSender;

/// Notifications for a view that renders the conversation.
///
/// Events are emitted after the corresponding change has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    TurnAppended(Turn),
    /// The text of a turn changed; `text` is the full new text.
    TurnUpdated { id: TurnId, text: String },
    /// A turn was swapped for another one at the same position.
    TurnReplaced { id: TurnId, turn: Turn },
    TurnRemoved { id: TurnId },
    HistoryCleared,
    ConfigChanged(GenerationConfig),
    AdminLoggedIn,
    RequestStarted,
    RequestFinished,
}

/// Result of [`ChatSession::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Maintenance mode and no administrator clearance; nothing happened.
    Unavailable,
    /// The reply streamed to completion into the turn `turn_id`.
    Completed { turn_id: TurnId, text: String },
    /// The request failed; `turn_id` is the error turn now in the log.
    Failed { turn_id: TurnId },
}

/// Clears the in-flight flag when the send ends, however it ends.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// One conversation and everything needed to continue it.
pub struct ChatSession {
    log: RwLock<ConversationLog>,
    config_store: Arc<ConfigStore>,
    access_gate: Arc<AccessGate>,
    orchestrator: SessionOrchestrator,
    error_message: String,
    in_flight: AtomicBool,
    events: Option<UnboundedSender<ChatEvent>>,
}

impl ChatSession {
    /// Creates a session continuing `log`.
    ///
    /// `error_message` is the text of the turn that replaces a failed reply.
    pub fn new(
        log: ConversationLog,
        config_store: Arc<ConfigStore>,
        access_gate: Arc<AccessGate>,
        orchestrator: SessionOrchestrator,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            log: RwLock::new(log),
            config_store,
            access_gate,
            orchestrator,
            error_message: error_message.into(),
            in_flight: AtomicBool::new(false),
            events: None,
        }
    }

    /// Sends every [`ChatEvent`] to `sender`.
    pub fn with_event_sender(mut self, sender: UnboundedSender<ChatEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    // ============================================================================
    // Chat
    // ============================================================================

    /// Submits a user message and streams the reply into the log.
    ///
    /// The user turn keeps `text` exactly as typed. Provider failures are
    /// not returned as errors: they end up as the error turn and
    /// [`SubmitOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// Returns `RequestInFlight` if another submit has not finished yet.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome> {
        if text.trim().is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::warn!("[ChatSession] Submit rejected: a request is already in flight");
            return Err(NeurobotError::RequestInFlight);
        };

        let config = self.config_store.current();
        let clearance = self.access_gate.clearance();
        if !config.is_system_active && !clearance.is_admin() {
            tracing::info!("[ChatSession] Submit refused: system is in maintenance mode");
            return Ok(SubmitOutcome::Unavailable);
        }

        // Phase 1: history as it stood before this turn, then the two new turns
        let user_turn = Turn::user(text);
        let placeholder = Turn::placeholder();
        let placeholder_id = placeholder.id.clone();
        let history = {
            let mut log = self.write_log();
            let history = log.snapshot();
            log.append(user_turn.clone())?;
            log.append(placeholder.clone())?;
            history
        };
        self.emit(ChatEvent::TurnAppended(user_turn));
        self.emit(ChatEvent::TurnAppended(placeholder));
        self.emit(ChatEvent::RequestStarted);

        // Phase 2: fill the placeholder by id
        let result = self
            .orchestrator
            .send_turn(&history, text, &config, clearance, |accumulated| {
                self.update_placeholder(&placeholder_id, accumulated)
            })
            .await;

        let outcome = match result {
            Ok(text) => {
                tracing::info!("[ChatSession] Reply completed ({} byte(s))", text.len());
                SubmitOutcome::Completed {
                    turn_id: placeholder_id,
                    text,
                }
            }
            Err(e) => {
                tracing::error!("[ChatSession] Request failed: {}", e);
                let turn_id = self.install_error_turn(&placeholder_id);
                SubmitOutcome::Failed { turn_id }
            }
        };

        self.emit(ChatEvent::RequestFinished);
        Ok(outcome)
    }

    fn update_placeholder(&self, id: &TurnId, accumulated: &str) {
        let updated = self.write_log().replace_text(id, accumulated);
        if updated {
            self.emit(ChatEvent::TurnUpdated {
                id: id.clone(),
                text: accumulated.to_string(),
            });
        } else {
            tracing::debug!("[ChatSession] Placeholder {} is gone, dropping chunk", id);
        }
    }

    /// Puts the error turn where the placeholder was, or at the end if the
    /// placeholder has been removed in the meantime.
    fn install_error_turn(&self, placeholder_id: &TurnId) -> TurnId {
        let error_turn = Turn::model(self.error_message.clone());
        let turn_id = error_turn.id.clone();

        let replaced = self
            .write_log()
            .replace_turn(placeholder_id, error_turn.clone());
        if replaced {
            self.emit(ChatEvent::TurnReplaced {
                id: placeholder_id.clone(),
                turn: error_turn,
            });
            return turn_id;
        }

        let appended = self.write_log().append(error_turn.clone());
        match appended {
            Ok(()) => self.emit(ChatEvent::TurnAppended(error_turn)),
            Err(e) => tracing::error!("[ChatSession] Failed to append error turn: {}", e),
        }
        turn_id
    }

    // ============================================================================
    // Access
    // ============================================================================

    /// Tries to unlock administrator mode with `code`.
    pub fn login(&self, code: &str) -> bool {
        let unlocked = self.access_gate.authenticate(code);
        if unlocked {
            self.emit(ChatEvent::AdminLoggedIn);
        }
        unlocked
    }

    pub fn clearance(&self) -> Clearance {
        self.access_gate.clearance()
    }

    /// Whether a submit would be sent rather than refused for maintenance.
    pub fn is_available(&self) -> bool {
        self.config_store.current().is_system_active || self.clearance().is_admin()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.read_log().snapshot()
    }

    pub fn config(&self) -> GenerationConfig {
        self.config_store.current()
    }

    // ============================================================================
    // Administrator operations
    // ============================================================================

    /// Replaces the text of a turn. Returns `false` if the turn is gone.
    ///
    /// Editing the placeholder of an in-flight reply is allowed; the next
    /// streamed chunk overwrites the edit.
    pub fn edit_turn(&self, id: &TurnId, text: impl Into<String>) -> Result<bool> {
        self.access_gate.require_admin("edit message")?;

        let text = text.into();
        let edited = self.write_log().replace_text(id, text.clone());
        if edited {
            tracing::info!("[ChatSession] Turn {} edited", id);
            self.emit(ChatEvent::TurnUpdated {
                id: id.clone(),
                text,
            });
        }
        Ok(edited)
    }

    /// Removes a turn, returning it if it was present.
    pub fn delete_turn(&self, id: &TurnId) -> Result<Option<Turn>> {
        self.access_gate.require_admin("delete message")?;

        let removed = self.write_log().remove(id);
        if removed.is_some() {
            tracing::info!("[ChatSession] Turn {} deleted", id);
            self.emit(ChatEvent::TurnRemoved { id: id.clone() });
        }
        Ok(removed)
    }

    /// Empties the conversation.
    pub fn clear_history(&self) -> Result<()> {
        self.access_gate.require_admin("clear history")?;

        self.write_log().clear();
        tracing::info!("[ChatSession] History cleared");
        self.emit(ChatEvent::HistoryCleared);
        Ok(())
    }

    /// Makes `config` current for every later send and persists it.
    ///
    /// A persistence failure is only logged: the new config is in effect for
    /// the rest of the process either way.
    ///
    /// # Errors
    ///
    /// `AccessDenied` without administrator clearance, `InvalidConfig` if a
    /// parameter is out of range. Nothing changes in either case.
    pub fn update_config(&self, config: GenerationConfig) -> Result<GenerationConfig> {
        self.access_gate.require_admin("update configuration")?;

        match self.config_store.save(config) {
            Ok(()) => tracing::info!("[ChatSession] Configuration saved"),
            Err(e @ NeurobotError::InvalidConfig(_)) => return Err(e),
            Err(e) => tracing::warn!(
                "[ChatSession] Configuration applied but could not be persisted: {}",
                e
            ),
        }

        let current = self.config_store.current();
        self.emit(ChatEvent::ConfigChanged(current.clone()));
        Ok(current)
    }

    /// Turns maintenance mode off (`true`) or on (`false`).
    pub fn set_system_active(&self, active: bool) -> Result<GenerationConfig> {
        let config = self.config_store.current().with_system_active(active);
        self.update_config(config)
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn emit(&self, event: ChatEvent) {
        if let Some(sender) = &self.events {
            // A closed receiver only means nobody is watching anymore
            let _ = sender.send(event);
        }
    }

    fn read_log(&self) -> RwLockReadGuard<'_, ConversationLog> {
        self.log.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_log(&self) -> RwLockWriteGuard<'_, ConversationLog> {
        self.log.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
