//! OpenAI-compatible API client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::chat::ChatRequest;
use crate::error::{ConfigError, LlmError, Result};
use crate::llms::ProviderKind;
use crate::message::Message;
use crate::tool::ToolDefinition;

use super::config::OpenAIConfig;
use super::types::{
    OpenAIChatRequest, OpenAIErrorBody, OpenAIFunction, OpenAIFunctionCall, OpenAIMessage,
    OpenAITool, OpenAIToolCall,
};

/// Client for any OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAI {
    pub(crate) config: Arc<OpenAIConfig>,
    pub(crate) client: Client,
}

impl OpenAI {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] when the provider needs an
    /// API key and the configuration has none.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() && config.provider.requires_api_key() {
            let vars = config.provider.api_key_vars().join(" or ");
            return Err(ConfigError::missing_credential(config.provider.as_str(), vars).into());
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Create a client for `provider`, resolving its key from the environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the credential is missing.
    pub fn from_env(provider: ProviderKind) -> Result<Self> {
        Self::new(OpenAIConfig::for_provider(provider)?)
    }

    /// Get the provider family.
    #[must_use]
    pub fn provider(&self) -> ProviderKind {
        self.config.provider
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the default model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the chat completions URL.
    pub(crate) fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build a JSON POST request with authentication headers.
    pub(crate) fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(url)
            .header("Content-Type", "application/json");

        if !self.config.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.config.api_key));
        }
        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        req
    }

    /// Convert a message to the wire format.
    pub(crate) fn convert_message(msg: &Message) -> OpenAIMessage {
        let tool_calls = msg.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .map(|tc| OpenAIToolCall {
                    id: tc.id.clone(),
                    call_type: "function".to_owned(),
                    function: OpenAIFunctionCall {
                        name: tc.function.name.clone(),
                        arguments: tc.function.arguments.clone(),
                    },
                })
                .collect()
        });

        OpenAIMessage {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    /// Convert a tool definition to the wire format.
    pub(crate) fn convert_tool(tool: &ToolDefinition) -> OpenAITool {
        OpenAITool {
            tool_type: "function".to_owned(),
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }

    /// Build the request body.
    pub(crate) fn build_body(&self, request: &ChatRequest) -> OpenAIChatRequest {
        let model = if request.model.is_empty() {
            self.config.model.clone()
        } else {
            request.model.clone()
        };

        let tools = request
            .tools
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|t| t.iter().map(Self::convert_tool).collect());

        OpenAIChatRequest {
            model,
            messages: request.messages.iter().map(Self::convert_message).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop.clone(),
            tool_choice: if tools.is_some() {
                request.tool_choice.clone()
            } else {
                None
            },
            tools,
        }
    }

    /// Parse an error response.
    pub(crate) fn parse_error(&self, status: u16, body: &str) -> LlmError {
        let provider = self.config.provider.as_str();
        let parsed = serde_json::from_str::<OpenAIErrorBody>(body)
            .ok()
            .and_then(OpenAIErrorBody::into_error);

        let Some(error) = parsed else {
            return match status {
                401 | 403 => LlmError::auth(provider, format!("HTTP {status}: {body}")),
                429 => LlmError::rate_limited(provider),
                _ => LlmError::http_status(status, body.to_owned()).with_provider(provider),
            };
        };

        match status {
            401 | 403 => LlmError::auth(provider, error.message),
            429 => LlmError::rate_limited(provider),
            400 if error.message.contains("context_length")
                || error.code.as_deref() == Some("context_length_exceeded") =>
            {
                LlmError::context_exceeded(error.message).with_provider(provider)
            }
            500..=599 => LlmError::network(format!("HTTP {status}: {}", error.message))
                .with_provider(provider),
            _ => {
                let code = error
                    .code
                    .or(error.error_type)
                    .unwrap_or_else(|| status.to_string());
                LlmError::provider_code(provider, code, error.message)
            }
        }
    }
}
