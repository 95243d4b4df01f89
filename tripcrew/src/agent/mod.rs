//! Agents and the runner that drives them.
//!
//! - **[`Agent`]** is an immutable persona (role, goal, backstory) bound to a
//!   language model provider and a set of tools.
//! - **[`Runner`]** is a stateless execution engine that drives an agent
//!   through a think → act → observe loop until it produces a final answer.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tripcrew::agent::{Agent, RunConfig};
//!
//! let agent = Agent::builder("City Selection Expert")
//!     .goal("Select the best city based on weather, season, and prices")
//!     .backstory("An expert in analyzing travel data to pick ideal destinations")
//!     .provider(provider.clone())
//!     .build()?;
//!
//! let output = agent.run("Lisbon, Porto or Seville in May?", RunConfig::default()).await?;
//! println!("{output}");
//! ```

mod config;
pub mod prompts;
mod result;
mod runner;

pub use config::{
    Agent, AgentBuilder, DEFAULT_LLM_TIMEOUT, DEFAULT_MAX_STEPS, DEFAULT_TOOL_TIMEOUT,
};
pub use result::{AgentOutput, RunConfig, ToolCallRecord};
pub use runner::Runner;
