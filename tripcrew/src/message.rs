//! Message types for agent-model communication.
//!
//! Messages follow the chat completion conventions shared by the
//! OpenAI-compatible endpoints tripcrew talks to: a role, optional text
//! content, and for assistant turns an optional list of tool calls.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message carrying the agent persona.
    System,
    /// User message carrying the task prompt.
    #[default]
    User,
    /// Assistant (model) message.
    Assistant,
    /// Tool observation message.
    Tool,
}

impl Role {
    /// Get the wire representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// Function name and raw JSON arguments of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to call.
    pub name: String,
    /// Arguments encoded as a JSON string, exactly as the model produced them.
    pub arguments: String,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for the tool call.
    pub id: String,
    /// Type of the tool call (always "function").
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    /// The function to call.
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_owned()
}

impl ToolCall {
    /// Create a function tool call.
    #[must_use]
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Get the name of the function being called.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Get the raw argument string.
    #[must_use]
    pub fn arguments(&self) -> &str {
        &self.function.arguments
    }
}

/// A chat message in a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls made by the model (assistant messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Tool call this message answers (tool messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn text_message(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::text_message(Role::System, content)
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::text_message(Role::User, content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text_message(Role::Assistant, content)
    }

    /// Create an assistant message that requests tool calls.
    #[must_use]
    pub const fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    /// Create a tool observation message answering `tool_call_id`.
    #[must_use]
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Returns the text content, if any.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.content.clone()
    }

    /// Returns `true` if the message carries at least one tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_roles() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("u").role, Role::User);
        assert_eq!(Message::assistant("a").role, Role::Assistant);

        let tool = Message::tool("call_1", "4");
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool.text().as_deref(), Some("4"));
    }

    #[test]
    fn tool_call_accessors() {
        let call = ToolCall::function("call_1", "calculate", r#"{"expression":"2+2"}"#);
        assert_eq!(call.name(), "calculate");
        assert_eq!(call.arguments(), r#"{"expression":"2+2"}"#);
        assert_eq!(call.call_type, "function");

        let msg = Message::assistant_tool_calls(vec![call]);
        assert!(msg.has_tool_calls());
        assert!(msg.text().is_none());
        assert!(!Message::assistant_tool_calls(Vec::new()).has_tool_calls());
    }

    #[test]
    fn serializes_without_empty_fields() {
        let json = serde_json::to_value(Message::user("hi")).expect("serializable");
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
