//! tripcrew - role-playing language model agents that plan trips together.
//!
//! The crate has two layers:
//!
//! - an orchestration engine: [`agent`] personas driven by a think → act →
//!   observe [`Runner`](agent::Runner), tools, chat providers, and [`crew`]
//!   orchestration under a sequential or hierarchical [`Process`](crew::Process);
//! - the travel crew built on it: [`travel`] agents, task templates and
//!   [`TripCrew`](travel::TripCrew).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tripcrew::prelude::*;
//!
//! let provider = Arc::new(OpenAI::from_env(ProviderKind::Gemini)?);
//! let agents = TravelAgents::new(ModelHandle::new(provider));
//! let request = TripRequest::new("Berlin", "Lisbon, Porto", "May 3-10", "food, surfing");
//!
//! let output = TripCrew::new(agents, request).run(Process::Sequential).await?;
//! println!("{output}");
//! ```

pub mod agent;
pub mod callback;
pub mod cancel;
pub mod chat;
pub mod crew;
pub mod error;
pub mod llms;
pub mod message;
pub mod prelude;
pub mod tool;
pub mod tools;
pub mod travel;
pub mod usage;

pub use error::{ConfigError, CrewError, Error, LlmError, Result, ToolError};
