//! Session orchestration over a stateless streaming provider.
//!
//! Every turn replays the complete conversation: the request is rebuilt from
//! the current log, so administrator edits and deletions take effect on the
//! very next send. Streamed deltas are folded into a running total that is
//! handed to the caller, who owns the log and decides where the text goes.

use crate::access::Clearance;
use crate::config::GenerationConfig;
use crate::conversation::Turn;
use crate::error::{NeurobotError, Result};
use crate::provider::{HistoryEntry, SessionRequest, StreamingProvider};
use futures::StreamExt;
use std::sync::Arc;

/// Builds requests from the log and drives the provider stream.
///
/// The orchestrator never touches the conversation log and never retries.
/// Callers must serialize sends: one in-flight request per conversation.
#[derive(Clone)]
pub struct SessionOrchestrator {
    provider: Arc<dyn StreamingProvider>,
}

impl SessionOrchestrator {
    pub fn new(provider: Arc<dyn StreamingProvider>) -> Self {
        Self { provider }
    }

    /// Maps the log and the new message to a provider request.
    ///
    /// Pure and deterministic: the same log, text and config always yield
    /// the same request, with `Sender::User` → `"user"`, `Sender::Model` →
    /// `"model"` and order preserved.
    pub fn build_request(
        history: &[Turn],
        new_text: &str,
        config: &GenerationConfig,
    ) -> SessionRequest {
        let history = history
            .iter()
            .map(|turn| HistoryEntry::text(turn.sender.into(), turn.text.clone()))
            .collect();

        SessionRequest {
            model: config.model_name.clone(),
            history,
            system_instruction: config.system_instruction.clone(),
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            message: new_text.to_string(),
        }
    }

    /// Sends one turn and streams the reply.
    ///
    /// `history` is the log as it stood before the new user turn. For every
    /// non-empty delta, `on_chunk` receives the accumulated text so far, so a
    /// view can replace rather than append.
    ///
    /// # Returns
    ///
    /// The final accumulated text, equal to the last value passed to
    /// `on_chunk` (empty if the provider streamed nothing).
    ///
    /// # Errors
    ///
    /// - `EmptyInput`: `new_text` is blank; nothing is sent
    /// - `Maintenance`: the system is inactive and `clearance` is not admin;
    ///   nothing is sent
    /// - `Provider` / `Transport`: the request failed or the stream broke;
    ///   the stream is abandoned
    pub async fn send_turn<F>(
        &self,
        history: &[Turn],
        new_text: &str,
        config: &GenerationConfig,
        clearance: Clearance,
        mut on_chunk: F,
    ) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        if new_text.trim().is_empty() {
            return Err(NeurobotError::EmptyInput);
        }
        if !config.is_system_active && !clearance.is_admin() {
            return Err(NeurobotError::Maintenance);
        }
        if !config.is_system_active {
            tracing::info!("[Orchestrator] Maintenance mode bypassed by administrator");
        }

        let request = Self::build_request(history, new_text, config);
        tracing::info!(
            "[Orchestrator] Sending turn: model={}, history={} turn(s)",
            request.model,
            request.history.len()
        );

        let mut stream = self.provider.open_stream(&request).await.map_err(|e| {
            tracing::error!("[Orchestrator] Failed to open stream: {}", e);
            e
        })?;

        let mut accumulated = String::new();
        let mut chunks = 0usize;
        while let Some(delta) = stream.next().await {
            let delta = delta.map_err(|e| {
                tracing::error!("[Orchestrator] Stream aborted after {} chunk(s): {}", chunks, e);
                e
            })?;
            if delta.is_empty() {
                continue;
            }
            accumulated.push_str(&delta);
            chunks += 1;
            on_chunk(&accumulated);
        }

        tracing::debug!(
            "[Orchestrator] Stream completed: {} chunk(s), {} byte(s)",
            chunks,
            accumulated.len()
        );
        Ok(accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ConversationLog, Turn};
    use crate::provider::Role;
    use crate::testing::ScriptedProvider;

    fn orchestrator(provider: &Arc<ScriptedProvider>) -> SessionOrchestrator {
        SessionOrchestrator::new(provider.clone())
    }

    #[tokio::test]
    async fn test_first_turn_streams_accumulated_text() {
        let provider = Arc::new(ScriptedProvider::with_reply(&["Hi", " there"]));
        let config = GenerationConfig::default();

        let mut seen = Vec::new();
        let final_text = orchestrator(&provider)
            .send_turn(&[], "Hello", &config, Clearance::Guest, |text| {
                seen.push(text.to_string())
            })
            .await
            .unwrap();

        assert_eq!(seen, vec!["Hi".to_string(), "Hi there".to_string()]);
        assert_eq!(final_text, "Hi there");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].history.is_empty());
        assert_eq!(requests[0].message, "Hello");
        assert_eq!(requests[0].model, config.model_name);
        assert_eq!(requests[0].top_k, config.top_k);
    }

    #[test]
    fn test_build_request_maps_roles_in_order() {
        let history = vec![
            Turn::model("Greetings"),
            Turn::user("What is Rust?"),
            Turn::model("A language."),
        ];
        let config = GenerationConfig::default();

        let first = SessionOrchestrator::build_request(&history, "More?", &config);
        let second = SessionOrchestrator::build_request(&history, "More?", &config);
        assert_eq!(first, second);

        let roles: Vec<Role> = first.history.iter().map(|entry| entry.role).collect();
        assert_eq!(roles, vec![Role::Model, Role::User, Role::Model]);
        assert_eq!(first.history[1].parts[0].text, "What is Rust?");

        let json = serde_json::to_value(&first.history).unwrap();
        assert_eq!(json[0]["role"], "model");
        assert_eq!(json[1]["role"], "user");
    }

    #[tokio::test]
    async fn test_removed_turn_is_not_replayed() {
        let provider = Arc::new(ScriptedProvider::with_reply(&["ok"]));
        let mut log = ConversationLog::new();
        let keep = Turn::user("keep me");
        let drop_me = Turn::model("forget me");
        log.append(keep.clone()).unwrap();
        log.append(drop_me.clone()).unwrap();
        log.remove(&drop_me.id);

        orchestrator(&provider)
            .send_turn(
                log.turns(),
                "next",
                &GenerationConfig::default(),
                Clearance::Guest,
                |_| {},
            )
            .await
            .unwrap();

        let requests = provider.requests();
        let request = &requests[0];
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.history[0].parts[0].text, "keep me");
    }

    #[tokio::test]
    async fn test_inactive_system_blocks_guest() {
        let provider = Arc::new(ScriptedProvider::with_reply(&["never"]));
        let config = GenerationConfig::default().with_system_active(false);

        let mut called = false;
        let err = orchestrator(&provider)
            .send_turn(&[], "Hello", &config, Clearance::Guest, |_| called = true)
            .await
            .unwrap_err();

        assert_eq!(err, NeurobotError::Maintenance);
        assert!(!called);
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_inactive_system_allows_admin() {
        let provider = Arc::new(ScriptedProvider::with_reply(&["maintenance test"]));
        let config = GenerationConfig::default().with_system_active(false);

        let text = orchestrator(&provider)
            .send_turn(&[], "Hello", &config, Clearance::Admin, |_| {})
            .await
            .unwrap();

        assert_eq!(text, "maintenance test");
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected_before_sending() {
        let provider = Arc::new(ScriptedProvider::with_reply(&["never"]));
        let err = orchestrator(&provider)
            .send_turn(&[], "  \n\t", &GenerationConfig::default(), Clearance::Admin, |_| {})
            .await
            .unwrap_err();

        assert_eq!(err, NeurobotError::EmptyInput);
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_failure_aborts_after_partial_output() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_failure_after(&["partial"], NeurobotError::transport("connection reset"));

        let mut seen = Vec::new();
        let err = orchestrator(&provider)
            .send_turn(&[], "Hello", &GenerationConfig::default(), Clearance::Guest, |text| {
                seen.push(text.to_string())
            })
            .await
            .unwrap_err();

        assert!(err.is_provider_failure());
        assert_eq!(seen, vec!["partial".to_string()]);
        // Single attempt, no retry
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_is_returned() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_open_error(NeurobotError::provider(Some(429), "rate limited"));

        let err = orchestrator(&provider)
            .send_turn(&[], "Hello", &GenerationConfig::default(), Clearance::Guest, |_| {})
            .await
            .unwrap_err();

        assert_eq!(err, NeurobotError::provider(Some(429), "rate limited"));
    }

    #[tokio::test]
    async fn test_empty_deltas_are_skipped() {
        let provider = Arc::new(ScriptedProvider::with_reply(&["", "A", "", "B"]));

        let mut seen = Vec::new();
        let text = orchestrator(&provider)
            .send_turn(&[], "Hello", &GenerationConfig::default(), Clearance::Guest, |t| {
                seen.push(t.to_string())
            })
            .await
            .unwrap();

        assert_eq!(seen, vec!["A".to_string(), "AB".to_string()]);
        assert_eq!(text, "AB");
    }
}
