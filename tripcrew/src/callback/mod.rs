//! Lifecycle hooks for crew runs.
//!
//! - [`RunHooks`]: async trait observing tasks, agents, model and tool calls
//! - [`RunContext`]: per-event context (agent, task, step, usage)
//! - [`NoopRunHooks`]: the default, does nothing
//! - [`LoggingHooks`]: structured `tracing` events for every lifecycle step

mod context;
mod hooks;
mod logging;

pub use context::RunContext;
pub use hooks::{NoopRunHooks, RunHooks, SharedRunHooks};
pub use logging::{LogLevel, LoggingHooks};
