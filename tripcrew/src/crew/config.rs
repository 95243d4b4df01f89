//! The crew: agents, tasks and the strategy that connects them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::agent::{Agent, RunConfig};
use crate::callback::SharedRunHooks;
use crate::cancel::CancelSignal;
use crate::error::{CrewError, Result};

use super::output::CrewOutput;
use super::process::Process;
use super::task::{RenderedTask, Task};
use super::{hierarchical, sequential};

/// A validated orchestration run definition.
///
/// Build one with [`Crew::builder`]; [`CrewBuilder::build`] checks every
/// wiring rule so that [`kickoff`](Crew::kickoff) only fails on bad inputs
/// or during execution.
///
/// # Example
///
/// ```rust,ignore
/// let crew = Crew::builder()
///     .agents([city_selector.clone(), guide.clone()])
///     .task(Task::new("Pick a city among {cities}").agent(city_selector))
///     .task(Task::new("Describe the city").agent(guide))
///     .build()?;
///
/// let output = crew.kickoff(&inputs).await?;
/// ```
pub struct Crew {
    pub(crate) agents: Vec<Arc<Agent>>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) process: Process,
    pub(crate) manager: Option<Arc<Agent>>,
    pub(crate) hooks: Option<SharedRunHooks>,
    pub(crate) cancel: CancelSignal,
}

impl fmt::Debug for Crew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crew")
            .field("agents", &self.agents.iter().map(|a| a.role()).collect::<Vec<_>>())
            .field("tasks", &self.tasks)
            .field("process", &self.process)
            .field("manager", &self.manager.as_ref().map(|m| m.role()))
            .finish_non_exhaustive()
    }
}

impl Crew {
    /// Start building a crew.
    #[must_use]
    pub fn builder() -> CrewBuilder {
        CrewBuilder::default()
    }

    /// Returns the worker agents.
    #[must_use]
    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    /// Returns the tasks in declared order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns the orchestration strategy.
    #[must_use]
    pub const fn process(&self) -> Process {
        self.process
    }

    /// Returns the manager agent, if any.
    #[must_use]
    pub const fn manager(&self) -> Option<&Arc<Agent>> {
        self.manager.as_ref()
    }

    /// Returns the signal that cancels this crew's runs.
    #[must_use]
    pub const fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    /// Every placeholder the task templates expect, in order of first use.
    #[must_use]
    pub fn required_inputs(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for task in &self.tasks {
            for template in [&task.description, &task.expected_output] {
                for name in super::task::placeholders(template) {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }

    /// Run the crew.
    ///
    /// Templates are rendered against `inputs` before any model is called.
    ///
    /// # Errors
    ///
    /// Returns [`CrewError::MissingInput`] when a template placeholder has
    /// no input, [`Error::Cancelled`](crate::Error::Cancelled) when the
    /// crew's signal fires, and any fatal agent error (model failure,
    /// step limit).
    pub async fn kickoff(&self, inputs: &HashMap<String, String>) -> Result<CrewOutput> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "crew",
            run_id = %run_id,
            process = %self.process,
            tasks = self.tasks.len(),
            agents = self.agents.len(),
        );

        async {
            let rendered = self.render(inputs)?;
            info!(process = %self.process, tasks = rendered.len(), "Crew kickoff");

            let output = match self.process {
                Process::Sequential => sequential::run(self, &rendered, run_id).await?,
                Process::Hierarchical => hierarchical::run(self, &rendered, run_id).await?,
            };

            info!(
                invocations = output.invocations.len(),
                total_tokens = output.usage.total_tokens,
                "Crew finished"
            );
            Ok(output)
        }
        .instrument(span)
        .await
    }

    fn render(&self, inputs: &HashMap<String, String>) -> Result<Vec<RenderedTask>> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, task)| task.render(i, inputs).map_err(Into::into))
            .collect()
    }

    /// Run settings shared by every agent run of this crew.
    pub(crate) fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new().cancel(self.cancel.clone());
        if let Some(hooks) = &self.hooks {
            config = config.hooks(Arc::clone(hooks));
        }
        config
    }

    fn contains(&self, agent: &Agent) -> bool {
        self.agents.iter().any(|a| a.same_role(agent))
    }

    /// Check every wiring rule.
    ///
    /// # Errors
    ///
    /// Returns the first [`CrewError`] found.
    pub fn validate(&self) -> std::result::Result<(), CrewError> {
        if self.tasks.is_empty() {
            return Err(CrewError::NoTasks);
        }
        if self.agents.is_empty() {
            return Err(CrewError::NoAgents);
        }

        for (index, task) in self.tasks.iter().enumerate() {
            let refs = task.context_refs().unwrap_or_default();
            if let Some(&reference) = refs.iter().find(|&&r| r >= index) {
                return Err(CrewError::InvalidContext {
                    task: index,
                    reference,
                });
            }
            match &task.agent {
                Some(agent) if !self.contains(agent) => {
                    if let Some(manager) = &self.manager
                        && self.process.needs_manager()
                        && manager.same_role(agent)
                    {
                        return Err(CrewError::ManagerAssignedTask(manager.role().to_owned()));
                    }
                    return Err(CrewError::UnknownAgent {
                        task: index,
                        agent: agent.role().to_owned(),
                    });
                }
                None if self.process == Process::Sequential => {
                    return Err(CrewError::UnassignedTask(index));
                }
                _ => {}
            }
        }

        if self.process.needs_manager() {
            let manager = self.manager.as_ref().ok_or(CrewError::MissingManager)?;
            if self.contains(manager) {
                return Err(CrewError::ManagerIsWorker(manager.role().to_owned()));
            }
        } else if let Some(manager) = &self.manager {
            warn!(manager = %manager.role(), "Manager is ignored by the sequential process");
        }
        Ok(())
    }
}

/// Builder for [`Crew`].
#[derive(Default)]
pub struct CrewBuilder {
    agents: Vec<Arc<Agent>>,
    tasks: Vec<Task>,
    process: Process,
    manager: Option<Arc<Agent>>,
    hooks: Option<SharedRunHooks>,
    cancel: Option<CancelSignal>,
}

impl fmt::Debug for CrewBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrewBuilder")
            .field("agents", &self.agents.len())
            .field("tasks", &self.tasks.len())
            .field("process", &self.process)
            .finish_non_exhaustive()
    }
}

impl CrewBuilder {
    /// Add a worker agent.
    #[must_use]
    pub fn agent(mut self, agent: Arc<Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    /// Add several worker agents.
    #[must_use]
    pub fn agents(mut self, agents: impl IntoIterator<Item = Arc<Agent>>) -> Self {
        self.agents.extend(agents);
        self
    }

    /// Append a task.
    #[must_use]
    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Append several tasks.
    #[must_use]
    pub fn tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Set the orchestration strategy (default: sequential).
    #[must_use]
    pub const fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    /// Set the manager agent for the hierarchical process.
    #[must_use]
    pub fn manager(mut self, manager: Arc<Agent>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Set lifecycle hooks for every agent run.
    #[must_use]
    pub fn hooks(mut self, hooks: SharedRunHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Use an existing cancellation signal.
    #[must_use]
    pub fn cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Validate and build the crew.
    ///
    /// # Errors
    ///
    /// Returns the first [`CrewError`] found by [`Crew::validate`].
    pub fn build(self) -> std::result::Result<Crew, CrewError> {
        let crew = Crew {
            agents: self.agents,
            tasks: self.tasks,
            process: self.process,
            manager: self.manager,
            hooks: self.hooks,
            cancel: self.cancel.unwrap_or_default(),
        };
        crew.validate()?;
        Ok(crew)
    }
}
