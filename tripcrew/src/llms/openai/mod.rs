//! OpenAI-compatible chat completions client.
//!
//! One client covers every [`ProviderKind`](crate::llms::ProviderKind):
//! OpenAI itself, Gemini's compatibility endpoint, Groq and local Ollama.

mod chat;
mod client;
mod config;
mod types;

pub use client::OpenAI;
pub use config::OpenAIConfig;
