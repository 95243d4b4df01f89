//! Configuration schema definitions.
//!
//! Type-safe configuration structures with validation. Every table and field
//! is optional in the file; missing values take the defaults below.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tripcrew::crew::Process;
use tripcrew::llms::ProviderKind;
use tripcrew::travel::{DEFAULT_TEMPERATURE, TripRequest};

/// Environment variable overriding the provider.
pub const ENV_PROVIDER: &str = "TRIPCREW_PROVIDER";
/// Environment variable overriding the primary model.
pub const ENV_MODEL: &str = "TRIPCREW_MODEL";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Language model settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Orchestration settings.
    #[serde(default)]
    pub crew: CrewConfig,

    /// Default trip values, used for fields not given on the command line.
    #[serde(default)]
    pub trip: TripRequest,
}

/// Language model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider family.
    #[serde(default)]
    pub provider: ProviderKind,
    /// Model of the expert travel agent. Empty means the provider default.
    #[serde(default)]
    pub model: Option<String>,
    /// Model of the city selection expert and the local tour guide.
    /// Falls back to `model`.
    #[serde(default)]
    pub advanced_model: Option<String>,
    /// Model of the hierarchical manager. Falls back to `advanced_model`.
    #[serde(default)]
    pub manager_model: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL override, e.g. for a self-hosted gateway.
    #[serde(default)]
    pub base_url: Option<String>,
}

const fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

const fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            advanced_model: None,
            manager_model: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            base_url: None,
        }
    }
}

/// Orchestration settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewConfig {
    /// Default process.
    #[serde(default)]
    pub process: Process,
    /// Reasoning steps per agent run.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Time budget of a single tool call, in seconds.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// Log every lifecycle event of the run.
    #[serde(default)]
    pub verbose: bool,
}

const fn default_max_steps() -> usize {
    15
}

const fn default_tool_timeout_secs() -> u64 {
    60
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            process: Process::default(),
            max_steps: default_max_steps(),
            tool_timeout_secs: default_tool_timeout_secs(),
            verbose: false,
        }
    }
}

impl CrewConfig {
    /// Tool time budget as a [`Duration`].
    #[must_use]
    pub const fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

impl AppConfig {
    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        self.validate_with(|name| std::env::var(name).ok())
    }

    /// Same as [`validate`](Self::validate) with an explicit variable lookup.
    #[must_use]
    pub fn validate_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            issues.push(ConfigIssue::error(
                "llm.temperature",
                "Temperature must be between 0.0 and 2.0",
            ));
        }

        if self.llm.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "llm.timeout_secs",
                "Request timeout is 0, the HTTP client will not time out",
            ));
        }

        let provider = self.llm.provider;
        if provider.requires_api_key()
            && !provider
                .api_key_vars()
                .iter()
                .any(|var| lookup(var).is_some_and(|v| !v.trim().is_empty()))
        {
            issues.push(ConfigIssue::warning(
                "llm.provider",
                format!(
                    "No API key for {provider}. Set {}.",
                    provider.api_key_vars().join(" or ")
                ),
            ));
        }

        if self.crew.max_steps == 0 {
            issues.push(ConfigIssue::error(
                "crew.max_steps",
                "Max steps must be at least 1",
            ));
        }

        if self.crew.tool_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                "crew.tool_timeout_secs",
                "Tool timeout is 0, every tool call would time out immediately",
            ));
        }

        issues
    }

    /// Check if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level != IssueLevel::Error)
    }

    /// Merge environment variables into the configuration.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Same as [`with_env`](Self::with_env) with an explicit variable lookup.
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(ENV_PROVIDER).filter(|v| !v.trim().is_empty()) {
            match value.parse() {
                Ok(provider) => self.llm.provider = provider,
                Err(e) => tracing::warn!(variable = ENV_PROVIDER, error = %e, "ignoring override"),
            }
        }

        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.llm.model = Some(model);
        }

        self
    }

    /// Apply command-line overrides.
    ///
    /// Model names belong to a provider: switching to another provider
    /// without naming a model drops the configured models so that the new
    /// provider's default is used.
    #[must_use]
    pub fn with_overrides(mut self, provider: Option<ProviderKind>, model: Option<String>) -> Self {
        if let Some(provider) = provider
            && provider != self.llm.provider
        {
            self.llm.provider = provider;
            if model.is_none() {
                let dropped = [
                    self.llm.model.take(),
                    self.llm.advanced_model.take(),
                    self.llm.manager_model.take(),
                ];
                if dropped.iter().any(Option::is_some) {
                    tracing::warn!(
                        %provider,
                        "configured models do not apply to the selected provider, using its default"
                    );
                }
            }
        }

        if let Some(model) = model {
            self.llm.model = Some(model);
        }

        self
    }
}

/// Configuration validation issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., "crew.max_steps").
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", prefix, self.path, self.message)
    }
}

/// Severity level for configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// The run cannot start.
    Error,
    /// The run may fail or behave unexpectedly.
    Warning,
}
