//! Model provider families reachable through the OpenAI-compatible client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A model provider family.
///
/// Every supported provider exposes an OpenAI-compatible chat completions
/// endpoint, so one HTTP client serves them all; the kind only fixes the base
/// URL, the default model and where the API key comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI.
    OpenAI,
    /// Google Gemini through its OpenAI compatibility layer.
    #[default]
    Gemini,
    /// Groq.
    Groq,
    /// A local Ollama server.
    Ollama,
}

impl ProviderKind {
    /// All provider kinds.
    pub const ALL: [Self; 4] = [Self::OpenAI, Self::Gemini, Self::Groq, Self::Ollama];

    /// Returns the provider name used in config files and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
            Self::Ollama => "ollama",
        }
    }

    /// Returns the default chat completions base URL.
    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }

    /// Returns the default model.
    #[must_use]
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Gemini => "gemini-2.0-flash",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::Ollama => "llama3.2",
        }
    }

    /// Returns the environment variables consulted for the API key, in order.
    #[must_use]
    pub const fn api_key_vars(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAI => &["OPENAI_API_KEY"],
            Self::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Self::Groq => &["GROQ_API_KEY"],
            Self::Ollama => &[],
        }
    }

    /// Returns `true` if requests must carry an API key.
    #[must_use]
    pub const fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" | "google" => Ok(Self::Gemini),
            "groq" => Ok(Self::Groq),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::invalid(format!(
                "unknown provider '{other}' (expected one of: openai, gemini, groq, ollama)"
            ))),
        }
    }
}
