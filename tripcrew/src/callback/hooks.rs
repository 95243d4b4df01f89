//! Lifecycle hook trait for crew runs.
//!
//! # Lifecycle Events
//!
//! 1. **`on_task_start`**: the orchestrator dispatches a task
//! 2. **`on_agent_start`**: an agent begins working (a task or a delegation)
//! 3. **Step loop** (repeats until done):
//!    - `on_llm_start` → *model call* → `on_llm_end`
//!    - `on_tool_start` → *tool execution* → `on_tool_end`
//! 4. **`on_agent_end`**, or **`on_error`** on failure
//! 5. **`on_task_end`**
//!
//! In hierarchical runs, **`on_delegation`** fires whenever the manager hands
//! work to a coworker.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chat::ChatResponse;
use crate::error::Error;
use crate::message::Message;

use super::context::RunContext;

/// A shared, thread-safe [`RunHooks`] trait object.
pub type SharedRunHooks = Arc<dyn RunHooks>;

/// Run-level lifecycle hooks observing every agent of a crew.
///
/// All methods have default no-op implementations, so implementors only
/// override the events they need.
#[async_trait]
pub trait RunHooks: Send + Sync {
    /// Called before a task is dispatched.
    async fn on_task_start(&self, _ctx: &RunContext, _task: usize, _description: &str) {}

    /// Called after a task produced its output.
    async fn on_task_end(&self, _ctx: &RunContext, _task: usize, _output: &str) {}

    /// Called before an agent begins working.
    async fn on_agent_start(&self, _ctx: &RunContext, _agent_name: &str) {}

    /// Called after an agent produced its final answer.
    async fn on_agent_end(&self, _ctx: &RunContext, _agent_name: &str, _output: &str) {}

    /// Called just before invoking the model.
    async fn on_llm_start(&self, _ctx: &RunContext, _agent_name: &str, _messages: &[Message]) {}

    /// Called immediately after the model returns a response.
    async fn on_llm_end(&self, _ctx: &RunContext, _agent_name: &str, _response: &ChatResponse) {}

    /// Called immediately before a tool is invoked.
    async fn on_tool_start(
        &self,
        _ctx: &RunContext,
        _agent_name: &str,
        _tool_name: &str,
        _arguments: &str,
    ) {
    }

    /// Called after a tool completes.
    ///
    /// `observation` is the text fed back to the agent (output or failure).
    async fn on_tool_end(
        &self,
        _ctx: &RunContext,
        _agent_name: &str,
        _tool_name: &str,
        _observation: &str,
    ) {
    }

    /// Called when a manager delegates work to a coworker.
    async fn on_delegation(&self, _ctx: &RunContext, _from_agent: &str, _to_agent: &str) {}

    /// Called when an agent run fails.
    async fn on_error(&self, _ctx: &RunContext, _agent_name: &str, _error: &Error) {}
}

/// A [`RunHooks`] implementation that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRunHooks;

#[async_trait]
impl RunHooks for NoopRunHooks {}
