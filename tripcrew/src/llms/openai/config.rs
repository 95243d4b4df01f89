//! OpenAI-compatible client configuration.

use crate::error::ConfigError;
use crate::llms::ProviderKind;

/// Configuration for the OpenAI-compatible client.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Provider family the endpoint belongs to.
    pub provider: ProviderKind,
    /// API key for authentication (may be empty for keyless providers).
    pub api_key: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Default model to use.
    pub model: String,
    /// Optional organization ID (OpenAI only).
    pub organization: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl OpenAIConfig {
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Creates an OpenAI configuration with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_provider(ProviderKind::OpenAI, api_key)
    }

    /// Creates a configuration for `provider` with its default URL and model.
    #[must_use]
    pub fn with_provider(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            base_url: provider.default_base_url().to_owned(),
            model: provider.default_model().to_owned(),
            organization: None,
            timeout_secs: Some(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Resolves a configuration for `provider` from the environment.
    ///
    /// The API key is read from the provider's key variables in order
    /// (see [`ProviderKind::api_key_vars`]). `TRIPCREW_BASE_URL` overrides
    /// the base URL, which is how a self-hosted gateway is reached.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] when the provider needs a
    /// key and none of its variables is set.
    pub fn for_provider(provider: ProviderKind) -> Result<Self, ConfigError> {
        Self::for_provider_with(provider, |name| std::env::var(name).ok())
    }

    /// Same as [`for_provider`](Self::for_provider) with an explicit variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] when no key is found.
    pub fn for_provider_with(
        provider: ProviderKind,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let vars = provider.api_key_vars();
        let api_key = vars
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()));

        let api_key = match api_key {
            Some(key) => key,
            None if provider.requires_api_key() => {
                return Err(ConfigError::missing_credential(
                    provider.as_str(),
                    vars.join(" or "),
                ));
            }
            None => String::new(),
        };

        let mut config = Self::with_provider(provider, api_key);
        if let Some(url) = lookup("TRIPCREW_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url;
        }
        if provider == ProviderKind::OpenAI {
            config.organization = lookup("OPENAI_ORGANIZATION");
        }
        Ok(config)
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the organization ID.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn provider_defaults() {
        let config = OpenAIConfig::with_provider(ProviderKind::Groq, "k");
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.model, ProviderKind::Groq.default_model());
        assert_eq!(config.timeout_secs, Some(120));
    }

    #[test]
    fn builder() {
        let config = OpenAIConfig::new("key")
            .with_model("gpt-4o")
            .with_timeout(60)
            .with_base_url("http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout_secs, Some(60));
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn resolves_fallback_key_variable() {
        let config =
            OpenAIConfig::for_provider_with(ProviderKind::Gemini, env(&[("GOOGLE_API_KEY", "g")]))
                .unwrap();
        assert_eq!(config.api_key, "g");
        assert_eq!(config.provider, ProviderKind::Gemini);
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = OpenAIConfig::for_provider_with(ProviderKind::Gemini, env(&[])).unwrap_err();
        match err {
            ConfigError::MissingCredential { provider, variable } => {
                assert_eq!(provider, "gemini");
                assert_eq!(variable, "GEMINI_API_KEY or GOOGLE_API_KEY");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let err = OpenAIConfig::for_provider_with(ProviderKind::Groq, env(&[("GROQ_API_KEY", " ")]));
        assert!(err.is_err());
    }

    #[test]
    fn ollama_needs_no_key_and_base_url_overrides() {
        let config = OpenAIConfig::for_provider_with(
            ProviderKind::Ollama,
            env(&[("TRIPCREW_BASE_URL", "http://gpu-box:11434/v1")]),
        )
        .unwrap();
        assert!(config.api_key.is_empty());
        assert_eq!(config.base_url, "http://gpu-box:11434/v1");
    }
}
