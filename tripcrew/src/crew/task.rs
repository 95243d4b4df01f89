//! Task definitions and template interpolation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::agent::Agent;
use crate::error::CrewError;

static PLACEHOLDER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").ok());

/// Fill `{name}` placeholders from `inputs`.
///
/// Braces that do not enclose an identifier (JSON snippets, `{}`) are left
/// untouched.
///
/// # Errors
///
/// Returns [`CrewError::MissingInput`] for the first placeholder without a
/// matching input.
pub fn interpolate(template: &str, inputs: &HashMap<String, String>) -> Result<String, CrewError> {
    let Some(re) = PLACEHOLDER_RE.as_ref() else {
        return Ok(template.to_owned());
    };

    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in re.captures_iter(template) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = inputs
            .get(key.as_str())
            .ok_or_else(|| CrewError::MissingInput(key.as_str().to_owned()))?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Lists the placeholders a template expects, in order of first use.
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let Some(re) = PLACEHOLDER_RE.as_ref() else {
        return Vec::new();
    };
    let mut names: Vec<String> = Vec::new();
    for caps in re.captures_iter(template) {
        if let Some(key) = caps.get(1)
            && !names.iter().any(|n| n == key.as_str())
        {
            names.push(key.as_str().to_owned());
        }
    }
    names
}

/// One unit of work for a crew.
///
/// The description and expected output are templates; they are rendered
/// against the kickoff inputs before the run starts.
///
/// # Example
///
/// ```rust,ignore
/// let task = Task::new("Analyze and select the best city for the trip among {cities}.")
///     .expected_output("A detailed report on the chosen city")
///     .agent(city_selector.clone());
/// ```
#[derive(Clone, Default)]
pub struct Task {
    pub(crate) name: Option<String>,
    pub(crate) description: String,
    pub(crate) expected_output: String,
    pub(crate) agent: Option<Arc<Agent>>,
    pub(crate) context: Option<Vec<usize>>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("agent", &self.agent.as_ref().map(|a| a.role()))
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Task {
    /// Create a task from its description template.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Set a short name used in logs and reports.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the expected output template.
    #[must_use]
    pub fn expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    /// Assign the responsible agent.
    #[must_use]
    pub fn agent(mut self, agent: Arc<Agent>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Use only the outputs of these earlier tasks as context.
    ///
    /// Without this, every earlier task's output is passed along.
    #[must_use]
    pub fn context(mut self, tasks: impl IntoIterator<Item = usize>) -> Self {
        self.context = Some(tasks.into_iter().collect());
        self
    }

    /// Returns the task name, if set.
    #[must_use]
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the description template.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the expected output template.
    #[must_use]
    pub fn get_expected_output(&self) -> &str {
        &self.expected_output
    }

    /// Returns the assigned agent, if any.
    #[must_use]
    pub fn assigned_agent(&self) -> Option<&Arc<Agent>> {
        self.agent.as_ref()
    }

    /// Returns the explicit context references, if any.
    #[must_use]
    pub fn context_refs(&self) -> Option<&[usize]> {
        self.context.as_deref()
    }

    /// Indices of the earlier tasks whose output feeds this one.
    #[must_use]
    pub(crate) fn context_for(&self, index: usize) -> Vec<usize> {
        self.context
            .clone()
            .unwrap_or_else(|| (0..index).collect())
    }

    /// Render the description and expected output against `inputs`.
    pub(crate) fn render(
        &self,
        index: usize,
        inputs: &HashMap<String, String>,
    ) -> Result<RenderedTask, CrewError> {
        Ok(RenderedTask {
            index,
            name: self.name.clone(),
            description: interpolate(&self.description, inputs)?,
            expected_output: interpolate(&self.expected_output, inputs)?,
        })
    }
}

/// A task whose templates have been filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderedTask {
    pub(crate) index: usize,
    pub(crate) name: Option<String>,
    pub(crate) description: String,
    pub(crate) expected_output: String,
}
