//! End-to-end tests for the travel crew, driven by scripted providers.

#![allow(clippy::unwrap_used, clippy::panic, clippy::clone_on_ref_ptr)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tripcrew::prelude::*;
use tripcrew::travel::{CITY_SELECTION_EXPERT, EXPERT_TRAVEL_AGENT, LOCAL_TOUR_GUIDE, TRAVEL_MANAGER};

/// Offline stand-in for the web search tool.
struct StubSearch;

#[derive(Deserialize)]
struct StubSearchArgs {
    query: String,
}

#[async_trait]
impl Tool for StubSearch {
    const NAME: &'static str = "search_internet";
    type Args = StubSearchArgs;
    type Output = String;
    type Error = ToolError;

    fn description(&self) -> String {
        "Search the internet".to_owned()
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {"query": {"type": "string"}}, "required": ["query"]})
    }

    async fn call(&self, args: Self::Args) -> std::result::Result<Self::Output, Self::Error> {
        Ok(format!("Title: {}\nLink: https://example.com\nSnippet: sunny", args.query))
    }
}

fn request() -> TripRequest {
    TripRequest::new("Berlin", "Lisbon, Porto", "May 3-10", "food, surfing")
}

fn role_of(request: &ChatRequest) -> &'static str {
    let system = request.messages.first().and_then(|m| m.content.as_deref()).unwrap_or("");
    [TRAVEL_MANAGER, CITY_SELECTION_EXPERT, LOCAL_TOUR_GUIDE, EXPERT_TRAVEL_AGENT]
        .into_iter()
        .find(|role| system.starts_with(&format!("You are {role}.")))
        .unwrap_or("unknown")
}

fn tool_messages(request: &ChatRequest) -> usize {
    request.messages.iter().filter(|m| m.role == Role::Tool).count()
}

fn text(content: impl Into<String>) -> ChatResponse {
    ChatResponse::from_text(content).with_usage(Usage::new(10, 5))
}

fn call(id: &str, name: &str, arguments: &Value) -> ChatResponse {
    ChatResponse::from_tool_calls(vec![ToolCall::function(id, name, arguments.to_string())])
        .with_usage(Usage::new(10, 5))
}

/// Workers answer with their role; the manager delegates to each of them
/// once and then writes its own plan.
fn scripted_crew(request: &ChatRequest, _index: usize) -> Result<ChatResponse> {
    let role = role_of(request);
    if role != TRAVEL_MANAGER {
        return Ok(text(format!("{role} report")));
    }
    Ok(match tool_messages(request) {
        0 => call(
            "m1",
            "delegate_work",
            &json!({"task": "Pick the city", "context": "Lisbon or Porto", "coworker": CITY_SELECTION_EXPERT}),
        ),
        1 => call(
            "m2",
            "delegate_work",
            &json!({"task": "Write the city guide", "context": "Lisbon", "coworker": "\"local tour guide\""}),
        ),
        2 => call(
            "m3",
            "ask_question",
            &json!({"question": "What should the budget be?", "context": "7 days", "coworker": EXPERT_TRAVEL_AGENT}),
        ),
        _ => text("MANAGER PLAN: 7 days in Lisbon"),
    })
}

fn trip_with(provider: Arc<MockProvider>) -> TripCrew {
    let agents = TravelAgents::new(ModelHandle::new(provider)).with_search_tool(Arc::new(StubSearch));
    TripCrew::new(agents, request())
}

/// Route run logs to the test harness output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("tripcrew=debug")
        .with_test_writer()
        .try_init();
}

/// Delays every worker call; the manager answers immediately.
struct SlowWorkers {
    inner: Arc<MockProvider>,
    delay: Duration,
}

#[async_trait]
impl ChatProvider for SlowWorkers {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if role_of(request) != TRAVEL_MANAGER {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.chat(request).await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }
}

/// A crew whose workers take longer than the 100 ms tool timeout.
fn trip_with_slow_workers(provider: Arc<MockProvider>) -> TripCrew {
    let slow = Arc::new(SlowWorkers {
        inner: provider,
        delay: Duration::from_millis(400),
    });
    let agents = TravelAgents::new(ModelHandle::new(slow))
        .with_search_tool(Arc::new(StubSearch))
        .with_tool_timeout(Duration::from_millis(100));
    TripCrew::new(agents, request())
}

/// The manager hands one piece of work to the tour guide, then answers.
fn delegate_once(request: &ChatRequest, worker: Result<ChatResponse>) -> Result<ChatResponse> {
    if role_of(request) != TRAVEL_MANAGER {
        return worker;
    }
    Ok(match tool_messages(request) {
        0 => call(
            "m1",
            "delegate_work",
            &json!({"task": "Write the city guide", "context": "Lisbon", "coworker": LOCAL_TOUR_GUIDE}),
        ),
        _ => text("Manager wrote the plan"),
    })
}

// ---------------------------------------------------------------------------
// Sequential process
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sequential_invokes_each_agent_once_in_declared_order() {
    let city = Arc::new(MockProvider::new().with_text("Lisbon it is"));
    let guide = Arc::new(MockProvider::new().with_text("Lisbon guide"));
    let expert = Arc::new(MockProvider::new().with_text("7-day plan"));

    let agents = TravelAgents::new(ModelHandle::new(expert.clone()))
        .with_search_tool(Arc::new(StubSearch));
    let city_agent = Agent::builder(CITY_SELECTION_EXPERT).provider(city.clone()).build_shared().unwrap();
    let guide_agent = Agent::builder(LOCAL_TOUR_GUIDE).provider(guide.clone()).build_shared().unwrap();
    let expert_agent = agents.expert_travel_agent().unwrap();

    let crew = Crew::builder()
        .agents([expert_agent.clone(), city_agent.clone(), guide_agent.clone()])
        .tasks(TravelTasks::all(city_agent, guide_agent, expert_agent))
        .build()
        .unwrap();

    let output = crew.kickoff(&request().to_inputs()).await.unwrap();

    assert_eq!(
        output.invocation_order(),
        vec![CITY_SELECTION_EXPERT, LOCAL_TOUR_GUIDE, EXPERT_TRAVEL_AGENT]
    );
    assert_eq!(city.call_count(), 1);
    assert_eq!(guide.call_count(), 1);
    assert_eq!(expert.call_count(), 1);
    assert_eq!(output.raw, "7-day plan");
    assert_eq!(output.tasks_output.len(), 3);
    assert_eq!(output.usage.total_tokens, 45);

    // Later tasks see earlier outputs as context.
    let guide_prompt = guide.requests()[0].last_user_text().unwrap().to_owned();
    assert!(guide_prompt.contains("Lisbon it is"));
    let expert_prompt = expert.requests()[0].last_user_text().unwrap().to_owned();
    assert!(expert_prompt.contains("Lisbon it is"));
    assert!(expert_prompt.contains("Lisbon guide"));
    assert!(expert_prompt.contains("Berlin"));
}

#[tokio::test]
async fn failing_tool_call_does_not_abort_the_run() {
    let provider = Arc::new(MockProvider::from_fn(|request, _| {
        if role_of(request) != EXPERT_TRAVEL_AGENT {
            return Ok(text("notes"));
        }
        Ok(match tool_messages(request) {
            0 => call("c1", "calculate", &json!({"expression": "10/0"})),
            1 => call("c2", "calculate", &json!({"expression": "__import__('os')"})),
            _ => text("Budget: 1200 EUR"),
        })
    }));

    let output = trip_with(provider.clone()).run(Process::Sequential).await.unwrap();

    assert_eq!(output.raw, "Budget: 1200 EUR");
    let expert_requests: Vec<_> = provider
        .requests()
        .into_iter()
        .filter(|r| role_of(r) == EXPERT_TRAVEL_AGENT)
        .collect();
    let last = expert_requests.last().unwrap();
    let observations: Vec<_> = last
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .filter_map(|m| m.content.clone())
        .collect();
    assert_eq!(observations.len(), 2);
    assert!(observations.iter().all(|o| o.starts_with("Error")));
    assert!(observations[0].contains("division by zero"));
}

#[tokio::test]
async fn search_results_feed_back_as_observations() {
    let provider = Arc::new(MockProvider::from_fn(|request, _| {
        if role_of(request) == CITY_SELECTION_EXPERT && tool_messages(request) == 0 {
            return Ok(call("s1", "search_internet", &json!({"query": "Lisbon weather May"})));
        }
        Ok(text(format!("{} done", role_of(request))))
    }));

    let output = trip_with(provider.clone()).run(Process::Sequential).await.unwrap();

    assert_eq!(output.tasks_output[0].raw, "City Selection Expert done");
    let second = provider
        .requests()
        .into_iter()
        .find(|r| role_of(r) == CITY_SELECTION_EXPERT && tool_messages(r) == 1)
        .unwrap();
    let observation = second.messages.last().and_then(|m| m.content.clone()).unwrap();
    assert!(observation.contains("Lisbon weather May"));
}

// ---------------------------------------------------------------------------
// Hierarchical process
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hierarchical_result_is_the_managers_own_answer() {
    let provider = Arc::new(MockProvider::from_fn(scripted_crew));
    let trip = trip_with(provider.clone());

    let crew = trip.crew(Process::Hierarchical).unwrap();
    assert!(
        crew.tasks()
            .iter()
            .all(|t| t.assigned_agent().is_none_or(|a| a.role() != TRAVEL_MANAGER))
    );
    assert!(crew.agents().iter().all(|a| a.role() != TRAVEL_MANAGER));

    let output = trip.run(Process::Hierarchical).await.unwrap();

    assert_eq!(output.process, Process::Hierarchical);
    assert_eq!(output.raw, "MANAGER PLAN: 7 days in Lisbon");
    assert!(output.tasks_output.iter().all(|t| t.raw != output.raw));
    assert_eq!(
        output.invocation_order(),
        vec![TRAVEL_MANAGER, CITY_SELECTION_EXPERT, LOCAL_TOUR_GUIDE, EXPERT_TRAVEL_AGENT]
    );
    assert_eq!(output.invocations[0].purpose, Purpose::Manage);
    assert_eq!(
        output.invocations[3].purpose,
        Purpose::Question { from: TRAVEL_MANAGER.to_owned() }
    );
    assert_eq!(output.tasks_output.len(), 3);
    assert_eq!(output.tasks_output[1].agent, LOCAL_TOUR_GUIDE);
    // Four manager turns plus one answer per coworker.
    assert_eq!(provider.call_count(), 7);
    assert_eq!(output.usage.total_tokens, 7 * 15);
}

#[tokio::test]
async fn manager_sees_only_the_delegation_tools() {
    let provider = Arc::new(MockProvider::from_fn(scripted_crew));
    trip_with(provider.clone()).run(Process::Hierarchical).await.unwrap();

    let requests = provider.requests();
    let manager = requests.iter().find(|r| role_of(r) == TRAVEL_MANAGER).unwrap();
    assert_eq!(manager.tool_names(), vec!["delegate_work", "ask_question"]);
    let backlog = manager.last_user_text().unwrap();
    assert!(backlog.contains("identify_city"));
    assert!(backlog.contains("Berlin"));

    let guide = requests.iter().find(|r| role_of(r) == LOCAL_TOUR_GUIDE).unwrap();
    assert_eq!(guide.tool_names(), vec!["search_internet"]);
    assert!(guide.last_user_text().unwrap().contains("Write the city guide"));
}

#[tokio::test]
async fn unknown_coworker_is_reported_back_to_the_manager() {
    let provider = Arc::new(MockProvider::from_fn(|request, _| {
        if role_of(request) != TRAVEL_MANAGER {
            return Ok(text("worker"));
        }
        Ok(match tool_messages(request) {
            0 => call(
                "m1",
                "delegate_work",
                &json!({"task": "Plan it", "context": "", "coworker": "Travel Blogger"}),
            ),
            _ => text("Planned without help"),
        })
    }));

    let output = trip_with(provider.clone()).run(Process::Hierarchical).await.unwrap();

    assert_eq!(output.raw, "Planned without help");
    assert!(output.tasks_output.is_empty());
    let last = provider.requests().last().cloned().unwrap();
    let observation = last.messages.last().and_then(|m| m.content.clone()).unwrap();
    assert!(observation.contains("coworker 'Travel Blogger' not found"));
    assert!(observation.contains(LOCAL_TOUR_GUIDE));
}

#[tokio::test]
async fn runs_with_identical_responses_have_identical_order() {
    let first = trip_with(Arc::new(MockProvider::from_fn(scripted_crew)))
        .run(Process::Hierarchical)
        .await
        .unwrap();
    let second = trip_with(Arc::new(MockProvider::from_fn(scripted_crew)))
        .run(Process::Hierarchical)
        .await
        .unwrap();

    assert_eq!(first.invocations, second.invocations);
    assert_eq!(first.raw, second.raw);
    assert_ne!(first.run_id, second.run_id);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_input_fails_before_any_model_call() {
    let provider = Arc::new(MockProvider::new().with_text("never"));
    let agent = Agent::builder("Planner").provider(provider.clone()).build_shared().unwrap();
    let crew = Crew::builder()
        .agent(agent.clone())
        .task(Task::new("Plan a trip from {origin} on {budget}").agent(agent))
        .build()
        .unwrap();

    let inputs = HashMap::from([("origin".to_owned(), "Berlin".to_owned())]);
    let err = crew.kickoff(&inputs).await.unwrap_err();

    assert!(matches!(err, Error::Crew(CrewError::MissingInput(ref key)) if key == "budget"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn model_failure_aborts_the_run() {
    let provider = Arc::new(
        MockProvider::new()
            .with_text("Lisbon")
            .with_error(LlmError::auth("mock", "invalid api key")),
    );

    let err = trip_with(provider.clone()).run(Process::Sequential).await.unwrap_err();

    assert!(matches!(err, Error::Llm(_)));
    // The third task never reaches the model.
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn coworker_model_failure_aborts_the_hierarchical_run() {
    init_tracing();
    let provider = Arc::new(MockProvider::from_fn(|request, _| {
        delegate_once(request, Err(LlmError::auth("mock", "invalid api key").into()))
    }));

    let err = trip_with(provider.clone()).run(Process::Hierarchical).await.unwrap_err();

    assert!(matches!(err, Error::Llm(_)));
    // One manager turn and one failed coworker call; the manager never resumes.
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn delegation_is_not_cut_off_by_the_tool_timeout() {
    init_tracing();
    let provider = Arc::new(MockProvider::from_fn(|request, _| {
        delegate_once(request, Ok(text("Lisbon guide")))
    }));

    let output = trip_with_slow_workers(provider.clone())
        .run(Process::Hierarchical)
        .await
        .unwrap();

    assert_eq!(output.raw, "Manager wrote the plan");
    assert_eq!(output.tasks_output.len(), 1);
    assert_eq!(output.tasks_output[0].raw, "Lisbon guide");
    let last = provider.requests().last().cloned().unwrap();
    let observation = last.messages.last().and_then(|m| m.content.clone()).unwrap();
    assert_eq!(observation, "Lisbon guide");
}

#[tokio::test]
async fn slow_coworker_failure_still_aborts_the_run() {
    init_tracing();
    let provider = Arc::new(MockProvider::from_fn(|request, _| {
        delegate_once(request, Err(LlmError::auth("mock", "invalid api key").into()))
    }));

    let err = trip_with_slow_workers(provider.clone())
        .run(Process::Hierarchical)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Llm(_)));
    assert_eq!(provider.call_count(), 2);
}

#[test]
fn cancelled_before_kickoff_makes_no_calls() {
    let provider = Arc::new(MockProvider::new().with_text("never"));
    let cancel = CancelSignal::new();
    cancel.cancel_with_reason("user interrupt");
    let trip = trip_with(provider.clone()).cancel_signal(cancel);

    let err = tokio_test::block_on(trip.run(Process::Sequential)).unwrap_err();

    assert!(matches!(err, Error::Cancelled(_)));
    assert_eq!(provider.call_count(), 0);
}

struct CancelAfterFirstTask(CancelSignal);

#[async_trait]
impl RunHooks for CancelAfterFirstTask {
    async fn on_task_end(&self, _ctx: &RunContext, task: usize, _output: &str) {
        if task == 0 {
            self.0.cancel();
        }
    }
}

#[tokio::test]
async fn cancellation_stops_at_the_next_task_boundary() {
    let provider = Arc::new(MockProvider::from_fn(|request, _| Ok(text(role_of(request)))));
    let cancel = CancelSignal::new();
    let trip = trip_with(provider.clone())
        .cancel_signal(cancel.clone())
        .hooks(Arc::new(CancelAfterFirstTask(cancel)));

    let err = trip.run(Process::Sequential).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled(_)));
    assert_eq!(provider.call_count(), 1);
}

#[test]
fn missing_credential_is_a_configuration_error() {
    let err = OpenAIConfig::for_provider_with(ProviderKind::Gemini, |_| None).unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential { .. }));
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

#[test]
fn calculator_grammar() {
    use tripcrew::tools::evaluate;

    assert_eq!(evaluate("2+2").unwrap(), "4");
    assert_eq!(evaluate("(1200 + 350) * 2").unwrap(), "3100");
    assert!(evaluate("10/0").is_err());
    assert!(evaluate("__import__('os')").is_err());
}

#[tokio::test]
async fn calculator_tool_errors_are_tool_errors() {
    let ok = Tool::call_json(&CalculatorTool, json!({"expression": "2+2"})).await.unwrap();
    assert_eq!(ok, json!("4"));

    for expression in ["10/0", "__import__('os')"] {
        let err = Tool::call_json(&CalculatorTool, json!({ "expression": expression }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution(ref msg) if msg.starts_with("Error")));
    }
}
