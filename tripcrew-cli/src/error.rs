//! Error type of the `tripcrew` command.

use tripcrew::ConfigError;

/// Everything that can stop a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The crew run failed.
    #[error(transparent)]
    Run(#[from] tripcrew::Error),

    /// The configuration could not be loaded or saved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configuration has error-level issues.
    #[error("invalid configuration:\n{0}")]
    InvalidConfig(String),

    /// Trip fields are still blank after flags, prompts and defaults.
    #[error("missing trip field(s): {0}; pass them as flags, set them under [trip], or use --interactive")]
    MissingFields(String),

    /// Reading from the terminal failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type of the command handlers.
pub type Result<T> = std::result::Result<T, CliError>;
