//! Tools a manager uses to hand work to its coworkers.
//!
//! - [`DelegateWorkTool`] (`delegate_work`): a coworker performs a task
//! - [`AskQuestionTool`] (`ask_question`): a coworker answers a question
//!
//! Both run the coworker to completion and return its final answer as the
//! observation. They are not cut off by the manager's tool timeout; the
//! coworker's model timeout and step limit bound them instead. A fatal
//! failure of the coworker (model error, cancellation) is raised as
//! [`ToolError::Abort`] so the whole run stops.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::agent::prompts::task_prompt;
use crate::agent::{Agent, RunConfig, Runner};
use crate::callback::{NoopRunHooks, RunContext, RunHooks};
use crate::error::ToolError;
use crate::tool::{Tool, ToolBox, parameters_schema_for};

use super::output::{Invocation, Purpose, RunLog, TaskOutput};

/// Arguments for [`DelegateWorkTool`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DelegateWorkArgs {
    /// The task to delegate.
    pub task: String,
    /// Everything the coworker needs to know to do the task.
    #[serde(default)]
    pub context: String,
    /// Role of the coworker to delegate to.
    pub coworker: String,
}

/// Arguments for [`AskQuestionTool`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AskQuestionArgs {
    /// The question to ask.
    pub question: String,
    /// Everything the coworker needs to know to answer.
    #[serde(default)]
    pub context: String,
    /// Role of the coworker to ask.
    pub coworker: String,
}

/// The workers a manager may address, and how to run them.
pub(crate) struct Coworkers {
    manager: String,
    agents: Vec<Arc<Agent>>,
    config: RunConfig,
    log: RunLog,
}

impl fmt::Debug for Coworkers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coworkers")
            .field("manager", &self.manager)
            .field("agents", &self.roles())
            .finish_non_exhaustive()
    }
}

impl Coworkers {
    pub(crate) fn new(
        manager: impl Into<String>,
        agents: Vec<Arc<Agent>>,
        config: RunConfig,
        log: RunLog,
    ) -> Self {
        Self {
            manager: manager.into(),
            agents,
            config,
            log,
        }
    }

    fn roles(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.role()).collect()
    }

    fn find(&self, name: &str) -> Result<&Arc<Agent>, ToolError> {
        let wanted = name.trim().trim_matches(|c| c == '"' || c == '\'');
        self.agents
            .iter()
            .find(|a| a.role().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ToolError::execution(format!(
                    "Error: coworker '{name}' not found. Choose one of: {}",
                    self.roles().join(", ")
                ))
            })
    }

    /// Run a coworker on one piece of work and record it.
    async fn dispatch(
        &self,
        coworker: &str,
        request: &str,
        context: &str,
        purpose: Purpose,
    ) -> Result<String, ToolError> {
        if request.trim().is_empty() {
            return Err(ToolError::invalid_args("the work to hand over must not be empty"));
        }
        let agent = self.find(coworker)?;

        let noop = NoopRunHooks;
        let hooks: &dyn RunHooks = self.config.hooks.as_deref().unwrap_or(&noop);
        let ctx = RunContext::new().with_agent_name(&self.manager);
        hooks.on_delegation(&ctx, &self.manager, agent.role()).await;
        info!(from = %self.manager, to = %agent.role(), "Handing work to coworker");

        self.log.invoked(Invocation::new(agent.role(), purpose));

        let prompt = task_prompt(request, "", Some(context));
        let config = RunConfig {
            extra_tools: ToolBox::new(),
            task: None,
            ..self.config.clone()
        };
        let output = Runner::run(agent, prompt, config)
            .await
            .map_err(ToolError::abort)?;

        self.log.completed(TaskOutput {
            task: None,
            name: None,
            description: request.trim().to_owned(),
            agent: output.agent.clone(),
            raw: output.text.clone(),
            usage: output.usage,
        });
        Ok(output.text)
    }

    fn listing(&self) -> String {
        self.agents
            .iter()
            .map(|a| format!("- {}: {}", a.role(), a.goal()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Hands a task to a coworker and returns the coworker's answer.
#[derive(Debug, Clone)]
pub struct DelegateWorkTool {
    coworkers: Arc<Coworkers>,
}

impl DelegateWorkTool {
    pub(crate) const fn new(coworkers: Arc<Coworkers>) -> Self {
        Self { coworkers }
    }
}

#[async_trait]
impl Tool for DelegateWorkTool {
    const NAME: &'static str = "delegate_work";
    type Args = DelegateWorkArgs;
    type Output = String;
    type Error = ToolError;

    fn description(&self) -> String {
        format!(
            "Delegate a specific task to one of the following coworkers:\n{}\n\
             The coworker knows nothing about the task: put the task and ALL the context \
             needed to execute it in the input, explaining things instead of referencing them.",
            self.coworkers.listing()
        )
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema_for::<DelegateWorkArgs>()
    }

    fn uses_tool_timeout(&self) -> bool {
        false
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.coworkers
            .dispatch(
                &args.coworker,
                &args.task,
                &args.context,
                Purpose::Delegation {
                    from: self.coworkers.manager.clone(),
                },
            )
            .await
    }
}

/// Asks a coworker a question and returns the answer.
#[derive(Debug, Clone)]
pub struct AskQuestionTool {
    coworkers: Arc<Coworkers>,
}

impl AskQuestionTool {
    pub(crate) const fn new(coworkers: Arc<Coworkers>) -> Self {
        Self { coworkers }
    }
}

#[async_trait]
impl Tool for AskQuestionTool {
    const NAME: &'static str = "ask_question";
    type Args = AskQuestionArgs;
    type Output = String;
    type Error = ToolError;

    fn description(&self) -> String {
        format!(
            "Ask a specific question to one of the following coworkers:\n{}\n\
             The coworker knows nothing about the question: put the question and ALL the \
             context needed to answer it in the input.",
            self.coworkers.listing()
        )
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema_for::<AskQuestionArgs>()
    }

    fn uses_tool_timeout(&self) -> bool {
        false
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.coworkers
            .dispatch(
                &args.coworker,
                &args.question,
                &args.context,
                Purpose::Question {
                    from: self.coworkers.manager.clone(),
                },
            )
            .await
    }
}

/// Both delegation tools over the same coworkers.
pub(crate) fn delegation_tools(coworkers: &Arc<Coworkers>) -> ToolBox {
    let mut tools = ToolBox::new();
    tools.add(DelegateWorkTool::new(Arc::clone(coworkers)));
    tools.add(AskQuestionTool::new(Arc::clone(coworkers)));
    tools
}
