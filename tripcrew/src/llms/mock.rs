//! Scripted chat provider for tests and offline runs.
//!
//! [`MockProvider`] serves predefined responses in order and records every
//! request it receives, so orchestration can be exercised deterministically
//! without network access.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse};
use crate::error::{LlmError, Result};
use crate::message::ToolCall;
use crate::usage::Usage;

type Responder = Box<dyn Fn(&ChatRequest, usize) -> Result<ChatResponse> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<std::result::Result<ChatResponse, LlmError>>>),
    Responder(Responder),
}

/// A chat provider returning scripted responses.
///
/// # Example
///
/// ```rust,ignore
/// use tripcrew::prelude::*;
///
/// let provider = MockProvider::new()
///     .with_tool_call("calculate", r#"{"expression": "2+2"}"#)
///     .with_text("The answer is 4.");
/// ```
pub struct MockProvider {
    model: String,
    script: Script,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a provider with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_owned(),
            script: Script::Queue(Mutex::new(VecDeque::new())),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a provider that computes each response from the request.
    ///
    /// The closure receives the request and the 0-based call index.
    #[must_use]
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest, usize) -> Result<ChatResponse> + Send + Sync + 'static,
    {
        Self {
            script: Script::Responder(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Set the model name reported as the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Queue a response.
    #[must_use]
    pub fn with_response(self, response: ChatResponse) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queue a plain text answer.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(ChatResponse::from_text(text).with_usage(Usage::new(10, 5)))
    }

    /// Queue a single tool call with JSON-encoded arguments.
    #[must_use]
    pub fn with_tool_call(self, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        let index = self.queued();
        let call = ToolCall::function(format!("call_{index}"), name, arguments);
        self.with_response(ChatResponse::from_tool_calls(vec![call]).with_usage(Usage::new(10, 5)))
    }

    /// Queue a model failure.
    #[must_use]
    pub fn with_error(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, item: std::result::Result<ChatResponse, LlmError>) {
        if let Script::Queue(queue) = &self.script {
            lock(queue).push_back(item);
        }
    }

    fn queued(&self) -> usize {
        match &self.script {
            Script::Queue(queue) => lock(queue).len(),
            Script::Responder(_) => 0,
        }
    }

    /// Returns a copy of every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    /// Returns how many times `chat` was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns how many scripted responses are still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queued()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("model", &self.model)
            .field("calls", &self.call_count())
            .field("remaining", &self.queued())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        match &self.script {
            Script::Responder(responder) => responder(request, index),
            Script::Queue(queue) => {
                let next = lock(queue).pop_front();
                match next {
                    Some(Ok(response)) => Ok(response.with_model(self.model.clone())),
                    Some(Err(error)) => Err(error.into()),
                    None => Err(LlmError::internal(format!(
                        "mock script exhausted after {index} responses"
                    ))
                    .with_provider("mock")
                    .into()),
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
