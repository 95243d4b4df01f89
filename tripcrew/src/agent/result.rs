//! Agent run configuration and result types.

use std::fmt;

use serde::Serialize;

use crate::callback::SharedRunHooks;
use crate::cancel::CancelSignal;
use crate::tool::ToolBox;
use crate::usage::Usage;

/// Per-run settings passed to [`Runner::run`](super::Runner::run).
#[derive(Clone, Default)]
pub struct RunConfig {
    /// Lifecycle hooks observing the run.
    pub hooks: Option<SharedRunHooks>,
    /// Cancellation flag checked between reasoning steps.
    pub cancel: CancelSignal,
    /// Index of the task the run works on, reported to hooks.
    pub task: Option<usize>,
    /// Tools offered in addition to the agent's own, for this run only.
    pub extra_tools: ToolBox,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("hooks", &self.hooks.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .field("task", &self.task)
            .field("extra_tools", &self.extra_tools)
            .finish()
    }
}

impl RunConfig {
    /// Create a default run configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lifecycle hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: SharedRunHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Set the cancellation signal.
    #[must_use]
    pub fn cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Set the task index.
    #[must_use]
    pub const fn task(mut self, task: usize) -> Self {
        self.task = Some(task);
        self
    }

    /// Offer extra tools for this run.
    #[must_use]
    pub fn extra_tools(mut self, tools: ToolBox) -> Self {
        self.extra_tools = tools;
        self
    }
}

/// One tool invocation made during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallRecord {
    /// Step in which the call was made (1-based).
    pub step: usize,
    /// Tool name as requested by the model.
    pub name: String,
    /// Raw arguments as sent by the model.
    pub arguments: String,
    /// Observation fed back to the model.
    pub observation: String,
    /// Whether the tool succeeded.
    pub success: bool,
}

/// The outcome of a successful agent run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutput {
    /// Role of the agent that produced the answer.
    pub agent: String,
    /// The final answer.
    pub text: String,
    /// Reasoning steps used, including a forced final answer step.
    pub steps: usize,
    /// Token usage summed over every model call.
    pub usage: Usage,
    /// Every tool call, in order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Whether the answer had to be forced after the step limit.
    pub forced: bool,
}

impl AgentOutput {
    /// Number of tool calls that failed.
    #[must_use]
    pub fn failed_tool_calls(&self) -> usize {
        self.tool_calls.iter().filter(|c| !c.success).count()
    }
}

impl fmt::Display for AgentOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
