//! The agent reasoning loop.
//!
//! [`Runner`] drives one [`Agent`] through an explicit state machine:
//!
//! ```text
//! Thinking ──► ToolCall ──► Observing ──► Thinking
//!     │
//!     └──────► Done
//! ```
//!
//! - **Thinking**: one model call with the conversation so far
//! - **ToolCall**: every requested tool runs, one after another
//! - **Observing**: tool results are appended to the conversation
//! - **Done**: the model answered without requesting tools
//!
//! When the step limit is hit while the model still asks for tools, the
//! runner makes one last tool-free request for a final answer before
//! giving up with [`Error::MaxSteps`].

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::callback::{NoopRunHooks, RunContext, RunHooks};
use crate::chat::{ChatRequest, ChatResponse, ToolChoice};
use crate::error::{Error, LlmError, Result, ToolError};
use crate::message::{Message, ToolCall};
use crate::tool::{ToolBox, ToolDefinition, render_observation};
use crate::usage::Usage;

use super::Agent;
use super::prompts::{FORCE_FINAL_ANSWER, system_prompt};
use super::result::{AgentOutput, RunConfig, ToolCallRecord};

/// The phases of one agent run.
#[derive(Debug)]
enum Phase {
    Thinking,
    ToolCall(Vec<ToolCall>),
    Observing(Vec<(String, ToolCallRecord)>),
    Done(String),
}

/// Per-run mutable state, separated from the stateless [`Runner`].
struct RunState<'a> {
    agent: &'a Agent,
    config: &'a RunConfig,
    hooks: &'a dyn RunHooks,
    tools: ToolBox,
    definitions: Vec<ToolDefinition>,
    messages: Vec<Message>,
    context: RunContext,
    usage: Usage,
    records: Vec<ToolCallRecord>,
    forced: bool,
}

impl<'a> RunState<'a> {
    fn new(agent: &'a Agent, config: &'a RunConfig, hooks: &'a dyn RunHooks, input: &str) -> Self {
        let tools = agent.tools.merged(&config.extra_tools);
        let definitions = tools.definitions();
        let mut context = RunContext::new().with_agent_name(&agent.role);
        if let Some(task) = config.task {
            context = context.with_task(task);
        }

        Self {
            agent,
            config,
            hooks,
            tools,
            definitions,
            messages: vec![Message::system(system_prompt(agent)), Message::user(input)],
            context,
            usage: Usage::zero(),
            records: Vec::new(),
            forced: false,
        }
    }

    /// Advance the state machine until the agent answers or fails.
    async fn drive(&mut self) -> Result<String> {
        let mut phase = Phase::Thinking;
        loop {
            phase = match phase {
                Phase::Thinking => {
                    self.config.cancel.check()?;
                    if self.context.step() >= self.agent.max_steps {
                        return self.force_final_answer().await;
                    }
                    self.context.advance_step();
                    debug!(agent = %self.agent.role, step = self.context.step(), "Starting step");
                    let response = self.think(true).await?;
                    self.classify(response)?
                }
                Phase::ToolCall(calls) => Phase::Observing(self.act(&calls).await?),
                Phase::Observing(observations) => {
                    self.observe(observations);
                    Phase::Thinking
                }
                Phase::Done(answer) => return Ok(answer),
            };
        }
    }

    /// One model call, optionally offering the tools.
    async fn think(&mut self, with_tools: bool) -> Result<ChatResponse> {
        let mut request = ChatRequest::with_messages(&self.agent.model, self.messages.clone());
        if let Some(temperature) = self.agent.temperature {
            request = request.temperature(temperature);
        }
        if with_tools && !self.definitions.is_empty() {
            request = request
                .tools(self.definitions.clone())
                .tool_choice(ToolChoice::Auto);
        }

        self.hooks
            .on_llm_start(&self.context, &self.agent.role, &self.messages)
            .await;

        let response = self.call_model(&request).await.map_err(|e| {
            error!(
                error = %e,
                agent = %self.agent.role,
                step = self.context.step(),
                "LLM call failed"
            );
            e
        })?;

        self.hooks
            .on_llm_end(&self.context, &self.agent.role, &response)
            .await;
        if let Some(usage) = response.usage {
            self.usage += usage;
            self.context.add_usage(usage);
        }
        Ok(response)
    }

    /// Calls the model, retrying once on a transient failure.
    async fn call_model(&self, request: &ChatRequest) -> Result<ChatResponse> {
        match self.chat_once(request).await {
            Err(Error::Llm(err)) if err.is_retryable() => {
                warn!(agent = %self.agent.role, error = %err, "Retrying model call once");
                self.chat_once(request).await
            }
            other => other,
        }
    }

    async fn chat_once(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let provider = &self.agent.provider;
        let budget = self.agent.llm_timeout;
        tokio::time::timeout(budget, provider.chat(request))
            .await
            .unwrap_or_else(|_| {
                Err(LlmError::timeout(format!("no response within {}s", budget.as_secs()))
                    .with_provider(provider.provider_name())
                    .into())
            })
    }

    /// Decide the next phase from a model response.
    fn classify(&mut self, response: ChatResponse) -> Result<Phase> {
        if let Some(calls) = response.tool_calls().filter(|c| !c.is_empty()) {
            let calls = calls.to_vec();
            self.messages.push(response.message);
            return Ok(Phase::ToolCall(calls));
        }

        match response.text().map(|t| t.trim().to_owned()) {
            Some(text) if !text.is_empty() => {
                self.messages.push(Message::assistant(text.clone()));
                Ok(Phase::Done(text))
            }
            _ => Err(LlmError::response_format("a final answer or tool calls", "an empty message")
                .with_provider(self.agent.provider.provider_name())
                .into()),
        }
    }

    /// Run every requested tool in order.
    async fn act(&self, calls: &[ToolCall]) -> Result<Vec<(String, ToolCallRecord)>> {
        let mut observations = Vec::with_capacity(calls.len());
        for call in calls {
            observations.push(self.execute_tool(call).await?);
        }
        Ok(observations)
    }

    fn observe(&mut self, observations: Vec<(String, ToolCallRecord)>) {
        for (id, record) in observations {
            self.messages.push(Message::tool(id, record.observation.clone()));
            self.records.push(record);
        }
    }

    /// Execute a single tool call with lifecycle hooks.
    ///
    /// Failures become observations, except [`ToolError::Abort`] which ends
    /// the run with the wrapped error.
    async fn execute_tool(&self, call: &ToolCall) -> Result<(String, ToolCallRecord)> {
        let name = call.name();
        let arguments = call.arguments();
        let span = info_span!(
            "tool",
            tool.name = %name,
            tool.id = %call.id,
            tool.success = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        async {
            self.hooks
                .on_tool_start(&self.context, &self.agent.role, name, arguments)
                .await;

            let (observation, success) = match self.invoke_tool(name, arguments).await {
                Ok(value) => (render_observation(&value), true),
                Err(ToolError::Abort(err)) => {
                    tracing::Span::current().record("error", tracing::field::display(&err));
                    return Err(*err);
                }
                Err(err) => {
                    warn!(tool = %name, error = %err, "Tool execution failed");
                    tracing::Span::current().record("error", tracing::field::display(&err));
                    (self.observation_for(&err), false)
                }
            };
            tracing::Span::current().record("tool.success", success);

            self.hooks
                .on_tool_end(&self.context, &self.agent.role, name, &observation)
                .await;

            Ok((
                call.id.clone(),
                ToolCallRecord {
                    step: self.context.step(),
                    name: name.to_owned(),
                    arguments: arguments.to_owned(),
                    observation,
                    success,
                },
            ))
        }
        .instrument(span)
        .await
    }

    /// Look up and call a tool, bounded by the agent's tool timeout unless
    /// the tool opts out.
    async fn invoke_tool(
        &self,
        name: &str,
        arguments: &str,
    ) -> std::result::Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;
        if arguments.trim().is_empty() {
            return Err(ToolError::invalid_args(format!("tool '{name}' requires an input")));
        }

        let call = tool.call_json(Value::String(arguments.to_owned()));
        if !tool.uses_tool_timeout() {
            return call.await;
        }

        let budget = self.agent.tool_timeout;
        tokio::time::timeout(budget, call)
            .await
            .map_err(|_| ToolError::Timeout {
                name: name.to_owned(),
                secs: budget.as_secs(),
            })?
    }

    /// The observation shown to the model for a failed tool call.
    fn observation_for(&self, err: &ToolError) -> String {
        match err {
            ToolError::Execution(msg) if msg.starts_with("Error") => msg.clone(),
            ToolError::NotFound(name) => format!(
                "Error: tool '{name}' does not exist. Available tools: {}",
                self.tools.names().join(", ")
            ),
            ToolError::Timeout { .. } => err.to_string(),
            _ => format!("Error: {err}"),
        }
    }

    /// Ask for a final answer without tools after the step limit.
    async fn force_final_answer(&mut self) -> Result<String> {
        warn!(
            agent = %self.agent.role,
            max_steps = self.agent.max_steps,
            "Step limit reached, asking for a final answer"
        );
        self.forced = true;
        self.messages.push(Message::user(FORCE_FINAL_ANSWER));
        self.context.advance_step();

        let response = self.think(false).await?;
        let text = response
            .text()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty() && !response.has_tool_calls());

        match text {
            Some(text) => {
                self.messages.push(Message::assistant(text.clone()));
                Ok(text)
            }
            None => Err(Error::max_steps(&self.agent.role, self.agent.max_steps)),
        }
    }

    fn into_output(self, text: String) -> AgentOutput {
        AgentOutput {
            agent: self.agent.role.clone(),
            text,
            steps: self.context.step(),
            usage: self.usage,
            tool_calls: self.records,
            forced: self.forced,
        }
    }
}

/// Stateless execution engine that drives an [`Agent`] through its reasoning loop.
///
/// All per-run state lives inside the run, so the same agent may be run
/// again (for another task or a delegation) while it is shared.
#[derive(Debug, Clone, Copy)]
pub struct Runner;

impl Runner {
    /// Execute an agent run to completion.
    ///
    /// `input` is the rendered task prompt; the system prompt is built from
    /// the agent's persona.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Llm`] if a model call fails (after one retry for
    /// transient failures), [`Error::MaxSteps`] if no final answer could be
    /// obtained, [`Error::Cancelled`] when the run's signal fires, or the
    /// error carried by a [`ToolError::Abort`].
    pub fn run<'a>(
        agent: &'a Agent,
        input: impl Into<String>,
        config: RunConfig,
    ) -> BoxFuture<'a, Result<AgentOutput>> {
        let input = input.into();
        let span = info_span!(
            "agent",
            agent.role = %agent.role,
            agent.model = %agent.model,
            agent.max_steps = agent.max_steps,
            task = ?config.task,
            agent.steps = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        Box::pin(Self::run_inner(agent, input, config).instrument(span))
    }

    async fn run_inner(agent: &Agent, input: String, config: RunConfig) -> Result<AgentOutput> {
        let noop = NoopRunHooks;
        let hooks: &dyn RunHooks = config.hooks.as_deref().unwrap_or(&noop);
        let mut state = RunState::new(agent, &config, hooks, &input);

        hooks.on_agent_start(&state.context, &agent.role).await;

        match state.drive().await {
            Ok(text) => {
                tracing::Span::current().record("agent.steps", state.context.step());
                info!(
                    agent = %agent.role,
                    steps = state.context.step(),
                    input_tokens = state.usage.input_tokens,
                    output_tokens = state.usage.output_tokens,
                    "Agent run completed",
                );
                hooks.on_agent_end(&state.context, &agent.role, &text).await;
                Ok(state.into_output(text))
            }
            Err(err) => {
                error!(error = %err, agent = %agent.role, "Agent run failed");
                tracing::Span::current().record("error", tracing::field::display(&err));
                hooks.on_error(&state.context, &agent.role, &err).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::cancel::CancelSignal;
    use crate::chat::SharedChatProvider;
    use crate::error::{CrewError, LlmErrorKind};
    use crate::llms::MockProvider;
    use crate::message::Role;
    use crate::tool::Tool;
    use crate::tools::CalculatorTool;

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        const NAME: &'static str = "slow";
        type Args = Value;
        type Output = String;
        type Error = ToolError;

        fn description(&self) -> String {
            "Never finishes in time".into()
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn call(&self, _args: Self::Args) -> std::result::Result<Self::Output, Self::Error> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".into())
        }
    }

    struct PatientTool;

    #[async_trait]
    impl Tool for PatientTool {
        const NAME: &'static str = "patient";
        type Args = Value;
        type Output = String;
        type Error = ToolError;

        fn description(&self) -> String {
            "Takes longer than the tool timeout".into()
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }

        fn uses_tool_timeout(&self) -> bool {
            false
        }

        async fn call(&self, _args: Self::Args) -> std::result::Result<Self::Output, Self::Error> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok("worth the wait".into())
        }
    }

    struct AbortTool;

    #[async_trait]
    impl Tool for AbortTool {
        const NAME: &'static str = "abort";
        type Args = Value;
        type Output = String;
        type Error = ToolError;

        fn description(&self) -> String {
            "Fails fatally".into()
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn call(&self, _args: Self::Args) -> std::result::Result<Self::Output, Self::Error> {
            Err(ToolError::abort(CrewError::NoTasks.into()))
        }
    }

    fn agent_with(provider: &Arc<MockProvider>) -> crate::agent::AgentBuilder {
        let shared: SharedChatProvider = provider.clone();
        Agent::builder("Expert Travel Agent")
            .goal("Plan trips")
            .backstory("Seasoned planner.")
            .tool(CalculatorTool)
            .provider(shared)
    }

    mod loop_states {
        use super::*;

        #[tokio::test]
        async fn direct_answer_finishes_in_one_step() {
            let provider = Arc::new(MockProvider::new().with_text("  Lisbon  "));
            let agent = agent_with(&provider).build().unwrap();

            let output = Runner::run(&agent, "Pick a city", RunConfig::default())
                .await
                .unwrap();

            assert_eq!(output.text, "Lisbon");
            assert_eq!(output.steps, 1);
            assert_eq!(output.usage.total_tokens, 15);
            assert!(!output.forced);

            let requests = provider.requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].messages[0].role, Role::System);
            assert_eq!(requests[0].last_user_text(), Some("Pick a city"));
            assert_eq!(requests[0].tool_names(), vec!["calculate"]);
        }

        #[tokio::test]
        async fn tool_result_is_observed_before_next_step() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_tool_call("calculate", r#"{"expression": "200*7"}"#)
                    .with_text("The budget is 1400."),
            );
            let agent = agent_with(&provider).build().unwrap();

            let output = agent.run("Budget?", RunConfig::default()).await.unwrap();

            assert_eq!(output.text, "The budget is 1400.");
            assert_eq!(output.steps, 2);
            assert_eq!(output.tool_calls.len(), 1);
            assert_eq!(output.tool_calls[0].observation, "1400");
            assert!(output.tool_calls[0].success);

            let second = &provider.requests()[1];
            let last = second.messages.last().unwrap();
            assert_eq!(last.role, Role::Tool);
            assert_eq!(last.tool_call_id.as_deref(), Some("call_0"));
            assert_eq!(last.text().as_deref(), Some("1400"));
        }

        #[tokio::test]
        async fn empty_answer_is_a_model_error() {
            let provider = Arc::new(MockProvider::new().with_text("   "));
            let agent = agent_with(&provider).build().unwrap();

            let err = agent.run("x", RunConfig::default()).await.unwrap_err();
            assert!(matches!(err, Error::Llm(ref e) if e.kind == LlmErrorKind::ResponseFormat));
        }
    }

    mod tool_failures {
        use super::*;

        #[tokio::test]
        async fn failing_tool_becomes_observation() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_tool_call("calculate", r#"{"expression": "10/0"}"#)
                    .with_text("Cannot divide by zero."),
            );
            let agent = agent_with(&provider).build().unwrap();

            let output = agent.run("x", RunConfig::default()).await.unwrap();
            assert_eq!(output.failed_tool_calls(), 1);
            assert!(output.tool_calls[0].observation.starts_with("Error:"));
            assert_eq!(output.text, "Cannot divide by zero.");
        }

        #[tokio::test]
        async fn unknown_tool_lists_available_tools() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_tool_call("teleport", r#"{"to": "Lisbon"}"#)
                    .with_text("done"),
            );
            let agent = agent_with(&provider).build().unwrap();

            let output = agent.run("x", RunConfig::default()).await.unwrap();
            let observation = &output.tool_calls[0].observation;
            assert!(observation.contains("'teleport' does not exist"));
            assert!(observation.contains("calculate"));
        }

        #[tokio::test]
        async fn blank_arguments_are_rejected() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_tool_call("calculate", "")
                    .with_text("done"),
            );
            let agent = agent_with(&provider).build().unwrap();

            let output = agent.run("x", RunConfig::default()).await.unwrap();
            assert!(!output.tool_calls[0].success);
            assert!(output.tool_calls[0].observation.contains("requires an input"));
        }

        #[tokio::test]
        async fn timed_out_tool_becomes_observation() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_tool_call("slow", "{}")
                    .with_text("moving on"),
            );
            let agent = agent_with(&provider)
                .tool(SlowTool)
                .tool_timeout(Duration::from_secs(1))
                .build()
                .unwrap();

            let output = agent.run("x", RunConfig::default()).await.unwrap();
            assert_eq!(
                output.tool_calls[0].observation,
                "Tool 'slow' timed out after 1s"
            );
            assert_eq!(output.text, "moving on");
        }

        #[tokio::test]
        async fn untimed_tool_outlives_the_tool_timeout() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_tool_call("patient", "{}")
                    .with_text("done"),
            );
            let agent = agent_with(&provider)
                .tool(PatientTool)
                .tool_timeout(Duration::from_millis(100))
                .build()
                .unwrap();

            let output = agent.run("x", RunConfig::default()).await.unwrap();
            assert!(output.tool_calls[0].success);
            assert_eq!(output.tool_calls[0].observation, "worth the wait");
        }

        #[tokio::test]
        async fn abort_propagates() {
            let provider = Arc::new(MockProvider::new().with_tool_call("abort", "{}"));
            let agent = agent_with(&provider).tool(AbortTool).build().unwrap();

            let err = agent.run("x", RunConfig::default()).await.unwrap_err();
            assert!(matches!(err, Error::Crew(CrewError::NoTasks)));
            assert_eq!(provider.call_count(), 1);
        }
    }

    mod limits {
        use super::*;

        #[tokio::test]
        async fn step_limit_forces_final_answer() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_tool_call("calculate", r#"{"expression": "1+1"}"#)
                    .with_tool_call("calculate", r#"{"expression": "2+2"}"#)
                    .with_text("Final: 4"),
            );
            let agent = agent_with(&provider).max_steps(2).build().unwrap();

            let output = agent.run("x", RunConfig::default()).await.unwrap();
            assert!(output.forced);
            assert_eq!(output.steps, 3);
            assert_eq!(output.text, "Final: 4");

            let last = provider.requests().pop().unwrap();
            assert!(last.tools.is_none());
            assert_eq!(last.last_user_text(), Some(FORCE_FINAL_ANSWER));
        }

        #[tokio::test]
        async fn max_steps_when_forced_answer_fails() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_tool_call("calculate", r#"{"expression": "1+1"}"#)
                    .with_tool_call("calculate", r#"{"expression": "1+1"}"#),
            );
            let agent = agent_with(&provider).max_steps(1).build().unwrap();

            let err = agent.run("x", RunConfig::default()).await.unwrap_err();
            assert!(matches!(err, Error::MaxSteps { max_steps: 1, .. }));
        }

        #[tokio::test]
        async fn transient_model_error_is_retried_once() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_error(LlmError::rate_limited("mock"))
                    .with_text("ok"),
            );
            let agent = agent_with(&provider).build().unwrap();

            let output = agent.run("x", RunConfig::default()).await.unwrap();
            assert_eq!(output.text, "ok");
            assert_eq!(provider.call_count(), 2);
        }

        #[tokio::test]
        async fn second_transient_failure_is_fatal() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_error(LlmError::network("reset"))
                    .with_error(LlmError::network("reset"))
                    .with_text("never"),
            );
            let agent = agent_with(&provider).build().unwrap();

            let err = agent.run("x", RunConfig::default()).await.unwrap_err();
            assert!(matches!(err, Error::Llm(ref e) if e.kind == LlmErrorKind::Network));
            assert_eq!(provider.call_count(), 2);
        }

        #[tokio::test]
        async fn auth_failure_is_not_retried() {
            let provider = Arc::new(
                MockProvider::new()
                    .with_error(LlmError::auth("mock", "bad key"))
                    .with_text("never"),
            );
            let agent = agent_with(&provider).build().unwrap();

            assert!(agent.run("x", RunConfig::default()).await.is_err());
            assert_eq!(provider.call_count(), 1);
        }

        #[tokio::test]
        async fn cancelled_run_never_calls_model() {
            let provider = Arc::new(MockProvider::new().with_text("never"));
            let agent = agent_with(&provider).build().unwrap();
            let cancel = CancelSignal::new();
            cancel.cancel_with_reason("user abort");

            let err = agent
                .run("x", RunConfig::new().cancel(cancel))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Cancelled(Some(ref r)) if r == "user abort"));
            assert_eq!(provider.call_count(), 0);
        }
    }
}
