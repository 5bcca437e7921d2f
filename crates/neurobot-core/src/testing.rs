//! Test doubles for the provider and storage capabilities.
//!
//! Compiled for this crate's own tests and, through the `test-support`
//! feature, for downstream crates' tests.

use crate::error::{NeurobotError, Result};
use crate::provider::{SessionRequest, StreamingProvider, TextStream};
use crate::storage::KeyValueStore;
use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

enum ScriptedResponse {
    Deltas(Vec<Result<String>>),
    OpenError(NeurobotError),
    Channel(mpsc::UnboundedReceiver<Result<String>>),
}

/// A provider that replays queued responses and records every request.
///
/// Responses are consumed in FIFO order, one per `open_stream` call. When
/// the queue is empty the call fails with a transport error.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<SessionRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider with one queued reply made of `deltas`.
    pub fn with_reply(deltas: &[&str]) -> Self {
        let provider = Self::new();
        provider.push_reply(deltas);
        provider
    }

    /// Queues a reply that streams `deltas` and completes.
    pub fn push_reply(&self, deltas: &[&str]) {
        let items = deltas.iter().map(|delta| Ok(delta.to_string())).collect();
        lock(&self.responses).push_back(ScriptedResponse::Deltas(items));
    }

    /// Queues a reply that streams `deltas` and then breaks with `error`.
    pub fn push_failure_after(&self, deltas: &[&str], error: NeurobotError) {
        let mut items: Vec<Result<String>> =
            deltas.iter().map(|delta| Ok(delta.to_string())).collect();
        items.push(Err(error));
        lock(&self.responses).push_back(ScriptedResponse::Deltas(items));
    }

    /// Queues a failure of the request itself.
    pub fn push_open_error(&self, error: NeurobotError) {
        lock(&self.responses).push_back(ScriptedResponse::OpenError(error));
    }

    /// Queues a reply driven by hand: every item sent on the returned
    /// channel becomes one stream item, and dropping it ends the stream.
    pub fn push_channel(&self) -> mpsc::UnboundedSender<Result<String>> {
        let (tx, rx) = mpsc::unbounded();
        lock(&self.responses).push_back(ScriptedResponse::Channel(rx));
        tx
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<SessionRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl StreamingProvider for ScriptedProvider {
    async fn open_stream(&self, request: &SessionRequest) -> Result<TextStream> {
        lock(&self.requests).push(request.clone());

        let response = lock(&self.responses).pop_front();
        match response {
            Some(ScriptedResponse::Deltas(items)) => Ok(futures::stream::iter(items).boxed()),
            Some(ScriptedResponse::OpenError(error)) => Err(error),
            Some(ScriptedResponse::Channel(rx)) => Ok(rx.boxed()),
            None => Err(NeurobotError::transport("no scripted response left")),
        }
    }
}

/// A key-value store whose every operation fails with a storage error.
#[derive(Debug, Default)]
pub struct FailingKeyValueStore;

impl KeyValueStore for FailingKeyValueStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(NeurobotError::storage("store unavailable"))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(NeurobotError::storage("store is read-only"))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(NeurobotError::storage("store is read-only"))
    }
}
