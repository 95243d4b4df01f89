//! Agent configuration types.
//!
//! An [`Agent`] is a persona bound to a language model: a role, a goal, a
//! backstory and the tools it may call. It contains no execution logic; the
//! [`Runner`](super::Runner) drives it through its reasoning loop.
//!
//! # Example
//!
//! ```rust,ignore
//! use tripcrew::prelude::*;
//!
//! let guide = Agent::builder("Local Tour Guide")
//!     .goal("Provide the BEST insights about the selected city")
//!     .backstory("A knowledgeable local guide with extensive information about the city")
//!     .tool(SearchInternetTool::new())
//!     .provider(provider.clone())
//!     .build()?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::chat::SharedChatProvider;
use crate::error::{ConfigError, Result};
use crate::tool::{SharedTool, Tool, ToolBox};

use super::result::{AgentOutput, RunConfig};

/// Default maximum number of reasoning steps per run.
pub const DEFAULT_MAX_STEPS: usize = 15;

/// Default time budget for a single tool call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Default time budget for a single model call.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);

/// A role-playing agent backed by a language model.
///
/// Agents are immutable once built and are shared by reference
/// (`Arc<Agent>`) between the tasks and the crew that use them.
pub struct Agent {
    pub(crate) role: String,
    pub(crate) goal: String,
    pub(crate) backstory: String,
    pub(crate) model: String,
    pub(crate) provider: SharedChatProvider,
    pub(crate) tools: ToolBox,
    pub(crate) temperature: Option<f32>,
    pub(crate) max_steps: usize,
    pub(crate) tool_timeout: Duration,
    pub(crate) llm_timeout: Duration,
    pub(crate) allow_delegation: bool,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("model", &self.model)
            .field("provider", &self.provider.provider_name())
            .field("tools", &self.tools.names())
            .field("max_steps", &self.max_steps)
            .field("allow_delegation", &self.allow_delegation)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Start building an agent with the given role.
    #[must_use]
    pub fn builder(role: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(role)
    }

    /// Returns the agent's role, which doubles as its name.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns the agent's goal.
    #[must_use]
    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// Returns the agent's backstory.
    #[must_use]
    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    /// Returns the model identifier sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the provider this agent talks to.
    #[must_use]
    pub const fn provider(&self) -> &SharedChatProvider {
        &self.provider
    }

    /// Returns the agent's tools.
    #[must_use]
    pub const fn tools(&self) -> &ToolBox {
        &self.tools
    }

    /// Returns the sampling temperature, if set.
    #[must_use]
    pub const fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Returns the maximum number of reasoning steps.
    #[must_use]
    pub const fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Returns the time budget for one tool call.
    #[must_use]
    pub const fn tool_timeout(&self) -> Duration {
        self.tool_timeout
    }

    /// Returns the time budget for one model call.
    #[must_use]
    pub const fn llm_timeout(&self) -> Duration {
        self.llm_timeout
    }

    /// Returns `true` if the agent may hand work to coworkers.
    #[must_use]
    pub const fn allow_delegation(&self) -> bool {
        self.allow_delegation
    }

    /// Returns `true` if `other` plays the same role.
    ///
    /// Roles are compared case-insensitively, the way coworkers are
    /// addressed during delegation.
    #[must_use]
    pub fn same_role(&self, other: &Self) -> bool {
        self.role.eq_ignore_ascii_case(&other.role)
    }

    /// Run this agent on a single prompt.
    ///
    /// Convenience wrapper around [`Runner::run`](super::Runner::run).
    pub fn run<'a>(
        &'a self,
        input: impl Into<String>,
        config: RunConfig,
    ) -> BoxFuture<'a, Result<AgentOutput>> {
        super::Runner::run(self, input, config)
    }
}

/// Builder for [`Agent`].
///
/// The provider is mandatory: [`build`](Self::build) fails with
/// [`ConfigError::MissingProvider`] without one.
#[derive(Default)]
pub struct AgentBuilder {
    role: String,
    goal: String,
    backstory: String,
    model: Option<String>,
    provider: Option<SharedChatProvider>,
    tools: ToolBox,
    temperature: Option<f32>,
    max_steps: Option<usize>,
    tool_timeout: Option<Duration>,
    llm_timeout: Option<Duration>,
    allow_delegation: bool,
}

impl fmt::Debug for AgentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentBuilder")
            .field("role", &self.role)
            .field("has_provider", &self.provider.is_some())
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}

impl AgentBuilder {
    /// Create a builder for the given role.
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Self::default()
        }
    }

    /// Set the agent's goal.
    #[must_use]
    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    /// Set the agent's backstory.
    #[must_use]
    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    /// Set the model identifier. Defaults to the provider's default model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the language model provider.
    #[must_use]
    pub fn provider(mut self, provider: SharedChatProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add a tool.
    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self
    where
        T::Output: 'static,
    {
        self.tools.add(tool);
        self
    }

    /// Add a tool that is shared with other agents.
    #[must_use]
    pub fn shared_tool(mut self, tool: SharedTool) -> Self {
        self.tools.add_shared(tool);
        self
    }

    /// Replace the whole toolbox.
    #[must_use]
    pub fn tools(mut self, tools: ToolBox) -> Self {
        self.tools = tools;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of reasoning steps (default: 15).
    #[must_use]
    pub const fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Set the per-call tool time budget (default: 60 s).
    #[must_use]
    pub const fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Set the per-call model time budget (default: 120 s).
    #[must_use]
    pub const fn llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }

    /// Allow the agent to delegate work to coworkers.
    #[must_use]
    pub const fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    /// Build the agent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingProvider`] if no provider was set and
    /// [`ConfigError::InvalidValue`] for an empty role or a zero step limit.
    pub fn build(self) -> std::result::Result<Agent, ConfigError> {
        let role = self.role.trim().to_owned();
        if role.is_empty() {
            return Err(ConfigError::invalid("agent role must not be empty"));
        }
        let provider = self
            .provider
            .ok_or_else(|| ConfigError::MissingProvider { agent: role.clone() })?;
        let max_steps = self.max_steps.unwrap_or(DEFAULT_MAX_STEPS);
        if max_steps == 0 {
            return Err(ConfigError::invalid(format!(
                "agent '{role}' needs at least one reasoning step"
            )));
        }
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_owned());

        Ok(Agent {
            role,
            goal: self.goal,
            backstory: self.backstory,
            model,
            provider,
            tools: self.tools,
            temperature: self.temperature,
            max_steps,
            tool_timeout: self.tool_timeout.unwrap_or(DEFAULT_TOOL_TIMEOUT),
            llm_timeout: self.llm_timeout.unwrap_or(DEFAULT_LLM_TIMEOUT),
            allow_delegation: self.allow_delegation,
        })
    }

    /// Build the agent and wrap it for sharing.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_shared(self) -> std::result::Result<Arc<Agent>, ConfigError> {
        self.build().map(Arc::new)
    }
}
