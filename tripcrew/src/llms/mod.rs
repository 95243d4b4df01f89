//! Language model backends.
//!
//! - [`openai`] - OpenAI-compatible HTTP client (OpenAI, Gemini, Groq, Ollama)
//! - [`mock`] - scripted provider for tests and offline runs

pub mod mock;
pub mod openai;
mod provider;

pub use mock::MockProvider;
pub use openai::{OpenAI, OpenAIConfig};
pub use provider::ProviderKind;
