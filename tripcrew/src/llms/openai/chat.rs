//! `ChatProvider` implementation for the OpenAI-compatible client.

use async_trait::async_trait;
use tracing::debug;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse, StopReason};
use crate::error::{LlmError, Result};
use crate::message::{Message, Role, ToolCall};

use super::client::OpenAI;
use super::types::OpenAIChatResponse;

impl OpenAI {
    /// Parse the response into a [`ChatResponse`].
    pub(crate) fn parse_response(response: OpenAIChatResponse) -> Result<ChatResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::response_format("at least one choice", "empty choices"))?;

        let stop_reason = match choice.finish_reason.as_deref() {
            Some("length") => StopReason::Length,
            Some("tool_calls" | "function_call") => StopReason::ToolCalls,
            Some("content_filter") => StopReason::ContentFilter,
            _ => StopReason::Stop,
        };

        let tool_calls = choice
            .message
            .tool_calls
            .map(|calls| {
                calls
                    .into_iter()
                    .map(|tc| ToolCall::function(tc.id, tc.function.name, tc.function.arguments))
                    .collect::<Vec<_>>()
            })
            .filter(|calls| !calls.is_empty());

        // Some compatible servers report "stop" even when tools were requested.
        let stop_reason = if tool_calls.is_some() {
            StopReason::ToolCalls
        } else {
            stop_reason
        };

        let message = Message {
            role: Role::Assistant,
            content: choice.message.content,
            tool_calls,
            tool_call_id: None,
        };

        Ok(ChatResponse {
            message,
            stop_reason,
            usage: response.usage,
            model: Some(response.model).filter(|m| !m.is_empty()),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAI {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.chat_url();
        let body = self.build_body(request);
        debug!(
            provider = self.provider_name(),
            model = %body.model,
            messages = body.messages.len(),
            "Sending chat request"
        );

        let response = self
            .build_request(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from(e).with_provider(self.provider_name()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &error_text).into());
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::from(e).with_provider(self.provider_name()))?;
        let parsed: OpenAIChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            LlmError::response_format(
                "valid chat completion response",
                format!("parse error: {e}, response: {response_text}"),
            )
            .with_provider(self.provider_name())
        })?;

        Self::parse_response(parsed)
    }

    fn provider_name(&self) -> &'static str {
        self.provider().as_str()
    }

    fn default_model(&self) -> &str {
        self.model()
    }
}
