//! Hook context carried through every lifecycle event.

use crate::usage::Usage;

/// Context passed to all hook methods during a crew run.
///
/// Hooks receive `&RunContext`: they observe the run but never steer it.
///
/// # Example
///
/// ```rust
/// use tripcrew::callback::RunContext;
///
/// let ctx = RunContext::new()
///     .with_agent_name("Local Tour Guide")
///     .with_task(1)
///     .with_step(3);
///
/// assert_eq!(ctx.agent_name(), Some("Local Tour Guide"));
/// assert_eq!(ctx.task(), Some(1));
/// assert_eq!(ctx.step(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Cumulative token usage across all model calls of the current agent run.
    usage: Usage,
    /// Current step number (1-indexed during execution, 0 before start).
    step: usize,
    /// Role of the currently active agent.
    agent_name: Option<String>,
    /// Index of the task being worked on, if any.
    task: Option<usize>,
}

impl RunContext {
    /// Create a new empty run context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the agent name.
    #[must_use]
    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    /// Set the task index.
    #[must_use]
    pub const fn with_task(mut self, task: usize) -> Self {
        self.task = Some(task);
        self
    }

    /// Set the current step number.
    #[must_use]
    pub const fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Get the cumulative token usage.
    #[must_use]
    pub const fn usage(&self) -> &Usage {
        &self.usage
    }

    /// Get the current step number.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.step
    }

    /// Get the agent name, if set.
    #[must_use]
    pub fn agent_name(&self) -> Option<&str> {
        self.agent_name.as_deref()
    }

    /// Get the task index, if set.
    #[must_use]
    pub const fn task(&self) -> Option<usize> {
        self.task
    }

    /// Add usage from one model call.
    pub fn add_usage(&mut self, usage: Usage) {
        self.usage += usage;
    }

    /// Advance to the next step.
    pub const fn advance_step(&mut self) {
        self.step += 1;
    }
}
