//! Unified error types for tripcrew.
//!
//! The error tree mirrors how failures are treated during a crew run:
//! - [`ConfigError`]: fatal, raised before any model is called
//! - [`LlmError`]: model invocation failures, fatal for the current run
//! - [`ToolError`]: recoverable, converted into an observation for the agent
//! - [`CrewError`]: invalid crew or task wiring, raised before kickoff

use std::fmt;

/// Result type alias for tripcrew operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for tripcrew.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration or credential error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Language model invocation error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Invalid crew definition.
    #[error("Crew error: {0}")]
    Crew(#[from] CrewError),

    /// An agent exhausted its reasoning steps without a final answer.
    #[error("Agent '{agent}' reached the maximum of {max_steps} steps without a final answer")]
    MaxSteps {
        /// Role of the agent that ran out of steps.
        agent: String,
        /// The configured step limit.
        max_steps: usize,
    },

    /// The run was cancelled between two blocking calls.
    #[error("Run cancelled{}", .0.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Cancelled(Option<String>),
}

impl Error {
    /// Create a max steps error.
    #[must_use]
    pub fn max_steps(agent: impl Into<String>, max_steps: usize) -> Self {
        Self::MaxSteps {
            agent: agent.into(),
            max_steps,
        }
    }
}

/// Error raised while resolving credentials or settings.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required credential was not found in the environment.
    #[error("missing credential for {provider}: set the {variable} environment variable")]
    MissingCredential {
        /// Provider name (e.g. "gemini").
        provider: String,
        /// The environment variable(s) that were consulted.
        variable: String,
    },

    /// An agent was built without a language model client.
    #[error("agent '{agent}' has no language model provider")]
    MissingProvider {
        /// Role of the agent.
        agent: String,
    },

    /// A setting has an unusable value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),

    /// I/O error while reading or writing a config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(String),

    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),
}

impl ConfigError {
    /// Create a missing credential error.
    #[must_use]
    pub fn missing_credential(provider: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::MissingCredential {
            provider: provider.into(),
            variable: variable.into(),
        }
    }

    /// Create an invalid value error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }
}

/// Error raised when a crew or its tasks are wired incorrectly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CrewError {
    /// The crew has no tasks.
    #[error("a crew needs at least one task")]
    NoTasks,

    /// The crew has no worker agents.
    #[error("a crew needs at least one agent")]
    NoAgents,

    /// The hierarchical process was selected without a manager.
    #[error("the hierarchical process requires a manager agent")]
    MissingManager,

    /// The manager was also assigned one of the tasks.
    #[error("manager '{0}' cannot also be assigned a task")]
    ManagerAssignedTask(String),

    /// The manager also appears in the worker set.
    #[error("manager '{0}' cannot also be one of the worker agents")]
    ManagerIsWorker(String),

    /// A task has no agent under the sequential process.
    #[error("task {0} has no assigned agent; the sequential process requires one")]
    UnassignedTask(usize),

    /// A task is assigned to an agent that is not part of the crew.
    #[error("task {task} is assigned to '{agent}', which is not a crew member")]
    UnknownAgent {
        /// Task index (0-based).
        task: usize,
        /// Role of the unknown agent.
        agent: String,
    },

    /// A template placeholder had no matching kickoff input.
    #[error("missing input '{0}' required by a task template")]
    MissingInput(String),

    /// A task names itself or a later task as context.
    #[error("task {task} cannot use task {reference} as context")]
    InvalidContext {
        /// Task index (0-based).
        task: usize,
        /// The offending context reference.
        reference: usize,
    },
}

/// Error type for language model invocations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LlmError {
    /// The error kind.
    pub kind: LlmErrorKind,
    /// The provider name (e.g., "openai", "gemini").
    pub provider: Option<String>,
    /// Additional error message.
    pub message: String,
    /// Optional error code from the provider.
    pub code: Option<String>,
}

/// Categories of LLM errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LlmErrorKind {
    /// Authentication or authorization failure.
    Auth,
    /// Rate limit exceeded.
    RateLimited,
    /// Context length exceeded.
    ContextExceeded,
    /// Invalid request parameters.
    InvalidRequest,
    /// Response could not be understood.
    ResponseFormat,
    /// Network or connection error.
    Network,
    /// The request did not complete in time.
    Timeout,
    /// HTTP status error.
    HttpStatus,
    /// Provider-specific error.
    Provider,
    /// Internal error.
    Internal,
}

impl LlmError {
    const fn bare(kind: LlmErrorKind, message: String) -> Self {
        Self {
            kind,
            provider: None,
            message,
            code: None,
        }
    }

    /// Create an authentication error.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::bare(LlmErrorKind::Auth, message.into())
        }
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::bare(
                LlmErrorKind::RateLimited,
                "Rate limit exceeded. Please retry after some time.".into(),
            )
        }
    }

    /// Create a context exceeded error.
    #[must_use]
    pub fn context_exceeded(message: impl Into<String>) -> Self {
        Self::bare(LlmErrorKind::ContextExceeded, message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::bare(LlmErrorKind::InvalidRequest, message.into())
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::bare(
            LlmErrorKind::ResponseFormat,
            format!("Expected {}, got {}", expected.into(), got.into()),
        )
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::bare(LlmErrorKind::Network, message.into())
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::bare(LlmErrorKind::Timeout, message.into())
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            code: Some(status.to_string()),
            ..Self::bare(
                LlmErrorKind::HttpStatus,
                format!("HTTP {status}: {}", body.into()),
            )
        }
    }

    /// Create a provider-specific error with an error code.
    #[must_use]
    pub fn provider_code(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: Some(provider.into()),
            code: Some(code.into()),
            ..Self::bare(LlmErrorKind::Provider, message.into())
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::bare(LlmErrorKind::Internal, message.into())
    }

    /// Attach the provider name if it is not already set.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        if self.provider.is_none() {
            self.provider = Some(provider.into());
        }
        self
    }

    /// Check if this is a retryable error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            LlmErrorKind::RateLimited | LlmErrorKind::Network | LlmErrorKind::Timeout
        )
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("Request timed out")
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Error type for tool execution failures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ToolError {
    /// Error during tool execution.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Invalid or missing arguments provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The tool did not finish within its time budget.
    #[error("Tool '{name}' timed out after {secs}s")]
    Timeout {
        /// Tool name.
        name: String,
        /// Time budget in seconds.
        secs: u64,
    },

    /// Work delegated through the tool failed fatally.
    ///
    /// Only delegation tools raise this. The runner propagates it instead of
    /// turning it into an observation.
    #[error("{0}")]
    Abort(Box<Error>),
}

impl ToolError {
    /// Create an execution error.
    #[must_use]
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create an invalid arguments error.
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Wrap a fatal run error.
    #[must_use]
    pub fn abort(err: Error) -> Self {
        Self::Abort(Box::new(err))
    }

    /// Returns `true` if the run must stop instead of observing this error.
    #[must_use]
    pub const fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}
