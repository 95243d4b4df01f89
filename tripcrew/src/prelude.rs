//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types and traits for easy access.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tripcrew::prelude::*;
//! ```

pub use crate::agent::{Agent, AgentBuilder, AgentOutput, RunConfig, Runner, ToolCallRecord};
pub use crate::callback::{
    LogLevel, LoggingHooks, NoopRunHooks, RunContext, RunHooks, SharedRunHooks,
};
pub use crate::cancel::CancelSignal;
pub use crate::chat::{
    ChatProvider, ChatRequest, ChatResponse, SharedChatProvider, StopReason, ToolChoice,
};
pub use crate::crew::{Crew, CrewBuilder, CrewOutput, Invocation, Process, Purpose, Task, TaskOutput};
pub use crate::error::{ConfigError, CrewError, Error, LlmError, Result, ToolError};
pub use crate::llms::{MockProvider, OpenAI, OpenAIConfig, ProviderKind};
pub use crate::message::{FunctionCall, Message, Role, ToolCall};
pub use crate::tool::{DynTool, SharedTool, Tool, ToolBox, ToolDefinition};
pub use crate::tools::{CalculatorTool, SearchInternetTool};
pub use crate::travel::{ModelHandle, TravelAgents, TravelTasks, TripCrew, TripRequest};
pub use crate::usage::Usage;
