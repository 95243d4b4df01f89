//! Orchestration strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a crew works through its tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// Tasks run strictly in declared order, each by its assigned agent.
    #[default]
    Sequential,
    /// A manager agent delegates the backlog to workers and compiles the result.
    Hierarchical,
}

impl Process {
    /// All strategies.
    pub const ALL: [Self; 2] = [Self::Sequential, Self::Hierarchical];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Hierarchical => "hierarchical",
        }
    }

    /// Returns `true` if the strategy needs a manager agent.
    #[must_use]
    pub const fn needs_manager(&self) -> bool {
        matches!(self, Self::Hierarchical)
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Process {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "hierarchical" => Ok(Self::Hierarchical),
            other => Err(ConfigError::invalid(format!(
                "unknown process '{other}' (expected sequential or hierarchical)"
            ))),
        }
    }
}
