//! Run reports.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use crate::usage::Usage;

use super::process::Process;

/// The output of one unit of work.
///
/// In a sequential run there is one per task. In a hierarchical run there is
/// one per delegation or question the manager sent to a coworker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutput {
    /// Index of the declared task, when the work was a task.
    pub task: Option<usize>,
    /// Task name, when known.
    pub name: Option<String>,
    /// The rendered task description, delegated task or question.
    pub description: String,
    /// Role of the agent that did the work.
    pub agent: String,
    /// The agent's final answer.
    pub raw: String,
    /// Tokens used for this piece of work.
    pub usage: Usage,
}

impl fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Why an agent was invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Purpose {
    /// Working on a declared task.
    Task {
        /// Task index.
        index: usize,
    },
    /// Managing the backlog of a hierarchical run.
    Manage,
    /// Doing work delegated by another agent.
    Delegation {
        /// Role of the delegating agent.
        from: String,
    },
    /// Answering a question from another agent.
    Question {
        /// Role of the asking agent.
        from: String,
    },
}

/// One entry of the invocation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Role of the invoked agent.
    pub agent: String,
    /// Why it was invoked.
    pub purpose: Purpose,
}

impl Invocation {
    /// Create a log entry.
    #[must_use]
    pub fn new(agent: impl Into<String>, purpose: Purpose) -> Self {
        Self {
            agent: agent.into(),
            purpose,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.purpose {
            Purpose::Task { index } => write!(f, "{} (task {index})", self.agent),
            Purpose::Manage => write!(f, "{} (manager)", self.agent),
            Purpose::Delegation { from } => write!(f, "{} (delegated by {from})", self.agent),
            Purpose::Question { from } => write!(f, "{} (asked by {from})", self.agent),
        }
    }
}

/// The final report of a crew run.
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    /// Identifier of this run, also attached to the `crew` tracing span.
    pub run_id: Uuid,
    /// The strategy that produced the result.
    pub process: Process,
    /// The final result: the last task's output, or the manager's answer.
    pub raw: String,
    /// Every unit of work, in completion order.
    pub tasks_output: Vec<TaskOutput>,
    /// Every agent invocation, in start order.
    pub invocations: Vec<Invocation>,
    /// Tokens used across the whole run.
    pub usage: Usage,
}

impl CrewOutput {
    /// Roles of the invoked agents, in order.
    #[must_use]
    pub fn invocation_order(&self) -> Vec<&str> {
        self.invocations.iter().map(|i| i.agent.as_str()).collect()
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Default)]
struct LogInner {
    invocations: Vec<Invocation>,
    outputs: Vec<TaskOutput>,
}

/// Append-only record of a run, shared with the delegation tools.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunLog {
    inner: Arc<Mutex<LogInner>>,
}

impl RunLog {
    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn invoked(&self, invocation: Invocation) {
        self.lock().invocations.push(invocation);
    }

    pub(crate) fn completed(&self, output: TaskOutput) {
        self.lock().outputs.push(output);
    }

    /// Take everything recorded so far.
    pub(crate) fn drain(&self) -> (Vec<Invocation>, Vec<TaskOutput>) {
        let mut inner = self.lock();
        (
            std::mem::take(&mut inner.invocations),
            std::mem::take(&mut inner.outputs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_display() {
        let inv = Invocation::new(
            "Local Tour Guide",
            Purpose::Delegation {
                from: "Crew Manager".into(),
            },
        );
        assert_eq!(inv.to_string(), "Local Tour Guide (delegated by Crew Manager)");
        assert_eq!(
            Invocation::new("City Selection Expert", Purpose::Task { index: 0 }).to_string(),
            "City Selection Expert (task 0)"
        );
    }

    #[test]
    fn log_is_shared_between_clones() {
        let log = RunLog::default();
        let clone = log.clone();
        clone.invoked(Invocation::new("a", Purpose::Manage));
        log.invoked(Invocation::new("b", Purpose::Task { index: 1 }));

        let (invocations, outputs) = log.drain();
        assert_eq!(invocations.len(), 2);
        assert!(outputs.is_empty());
        assert!(clone.drain().0.is_empty());
    }

    #[test]
    fn purpose_serializes_with_kind_tag() {
        let value = serde_json::to_value(Purpose::Task { index: 2 }).unwrap_or_default();
        assert_eq!(value["kind"], "task");
        assert_eq!(value["index"], 2);
    }
}
