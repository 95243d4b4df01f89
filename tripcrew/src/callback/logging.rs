//! Tracing-based logging implementation of [`RunHooks`].
//!
//! # Example
//!
//! ```rust
//! use tripcrew::callback::{LogLevel, LoggingHooks};
//!
//! // Default: logs at INFO level
//! let hooks = LoggingHooks::new();
//!
//! // Custom: logs at DEBUG level
//! let quiet = LoggingHooks::with_level(LogLevel::Debug);
//! ```

use async_trait::async_trait;

use crate::chat::ChatResponse;
use crate::error::Error;
use crate::message::Message;

use super::context::RunContext;
use super::hooks::RunHooks;

/// Longest observation or answer excerpt written to a log line.
const EXCERPT_CHARS: usize = 200;

/// Log verbosity level for hook events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace-level logging (most verbose).
    Trace,
    /// Debug-level logging.
    Debug,
    /// Info-level logging (default).
    #[default]
    Info,
    /// Warn-level logging.
    Warn,
}

/// Emit a log event at the specified level using `tracing` macros.
macro_rules! log_at_level {
    ($level:expr, $($arg:tt)*) => {
        match $level {
            LogLevel::Trace => tracing::trace!($($arg)*),
            LogLevel::Debug => tracing::debug!($($arg)*),
            LogLevel::Info  => tracing::info!($($arg)*),
            LogLevel::Warn  => tracing::warn!($($arg)*),
        }
    };
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// A [`RunHooks`] implementation that logs lifecycle events via `tracing`.
///
/// This is the "verbose" mode of a crew: every task, agent, model call and
/// tool call becomes a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks {
    level: LogLevel,
}

impl LoggingHooks {
    /// Create logging hooks at the default level (INFO).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create logging hooks with a custom log level.
    #[must_use]
    pub const fn with_level(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

#[async_trait]
impl RunHooks for LoggingHooks {
    async fn on_task_start(&self, _ctx: &RunContext, task: usize, description: &str) {
        log_at_level!(
            self.level,
            task,
            description = %excerpt(description),
            "Task started"
        );
    }

    async fn on_task_end(&self, _ctx: &RunContext, task: usize, output: &str) {
        log_at_level!(self.level, task, output_len = output.len(), "Task completed");
    }

    async fn on_agent_start(&self, ctx: &RunContext, agent_name: &str) {
        log_at_level!(
            self.level,
            agent = agent_name,
            task = ?ctx.task(),
            "Agent started"
        );
    }

    async fn on_agent_end(&self, ctx: &RunContext, agent_name: &str, output: &str) {
        let usage = ctx.usage();
        log_at_level!(self.level,
            agent = agent_name,
            steps = ctx.step(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            total_tokens = usage.total_tokens,
            output = %excerpt(output),
            "Agent completed"
        );
    }

    async fn on_llm_start(&self, ctx: &RunContext, agent_name: &str, messages: &[Message]) {
        log_at_level!(
            self.level,
            agent = agent_name,
            step = ctx.step(),
            message_count = messages.len(),
            "Model request started"
        );
    }

    async fn on_llm_end(&self, ctx: &RunContext, agent_name: &str, response: &ChatResponse) {
        let model = response.model.as_deref().unwrap_or("unknown");
        let usage_str = response
            .usage
            .map_or_else(|| "none".to_owned(), |u| u.to_string());
        log_at_level!(self.level,
            agent = agent_name,
            step = ctx.step(),
            model = model,
            usage = %usage_str,
            stop_reason = ?response.stop_reason,
            "Model request completed"
        );
    }

    async fn on_tool_start(
        &self,
        ctx: &RunContext,
        agent_name: &str,
        tool_name: &str,
        arguments: &str,
    ) {
        log_at_level!(
            self.level,
            agent = agent_name,
            step = ctx.step(),
            tool = tool_name,
            arguments = %excerpt(arguments),
            "Tool execution started"
        );
    }

    async fn on_tool_end(
        &self,
        ctx: &RunContext,
        agent_name: &str,
        tool_name: &str,
        observation: &str,
    ) {
        log_at_level!(
            self.level,
            agent = agent_name,
            step = ctx.step(),
            tool = tool_name,
            observation = %excerpt(observation),
            "Tool execution completed"
        );
    }

    async fn on_delegation(&self, _ctx: &RunContext, from_agent: &str, to_agent: &str) {
        log_at_level!(
            self.level,
            from = from_agent,
            to = to_agent,
            "Work delegated"
        );
    }

    async fn on_error(&self, ctx: &RunContext, agent_name: &str, error: &Error) {
        tracing::error!(
            agent = agent_name,
            step = ctx.step(),
            error = %error,
            "Agent run failed"
        );
    }
}
