//! Hierarchical process: a manager delegates the backlog and compiles the result.
//!
//! The manager sees every task at once, in declared order, and is given the
//! delegation tools. Which coworker works on what, in which order, and how
//! often, is up to the manager. Its own final answer is the crew's result.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::agent::prompts::task_prompt;
use crate::agent::Runner;
use crate::callback::{NoopRunHooks, RunContext, RunHooks};
use crate::error::{CrewError, Result};
use crate::usage::Usage;

use super::config::Crew;
use super::delegation::{AskQuestionTool, Coworkers, DelegateWorkTool, delegation_tools};
use super::output::{CrewOutput, Invocation, Purpose, RunLog};
use super::process::Process;
use super::task::RenderedTask;

/// Renders the manager's prompt: the coworkers, then the backlog.
pub(crate) fn backlog_prompt(tasks: &[RenderedTask], crew: &Crew) -> String {
    let mut prompt = String::from("You lead a crew with these coworkers:\n");
    for agent in &crew.agents {
        let _ = writeln!(prompt, "- {}: {}", agent.role(), agent.goal());
    }
    let _ = write!(
        prompt,
        "\nWork through the backlog below. Hand each piece of work to the most suitable \
         coworker with `{}`, and use `{}` when you need more information. The backlog order \
         is only a suggestion; repeat or reorder work as you see fit. Coworkers only know \
         what you tell them.\n",
        <DelegateWorkTool as crate::tool::Tool>::NAME,
        <AskQuestionTool as crate::tool::Tool>::NAME,
    );

    for (task, rendered) in crew.tasks.iter().zip(tasks) {
        let _ = write!(
            prompt,
            "\nTask {}{}:\n{}\n",
            rendered.index + 1,
            rendered
                .name
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default(),
            rendered.description.trim()
        );
        if !rendered.expected_output.trim().is_empty() {
            let _ = writeln!(prompt, "Expected output: {}", rendered.expected_output.trim());
        }
        if let Some(agent) = &task.agent {
            let _ = writeln!(prompt, "Suggested coworker: {}", agent.role());
        }
    }

    prompt.push_str(
        "\nWhen all the work is done, compile the final answer yourself from what your \
         coworkers delivered.",
    );
    prompt
}

pub(super) async fn run(crew: &Crew, tasks: &[RenderedTask], run_id: Uuid) -> Result<CrewOutput> {
    crew.cancel.check()?;
    let manager = crew.manager.as_ref().ok_or(CrewError::MissingManager)?;

    let noop = NoopRunHooks;
    let hooks: &dyn RunHooks = crew.hooks.as_deref().unwrap_or(&noop);
    let log = RunLog::default();

    let coworkers = Arc::new(Coworkers::new(
        manager.role(),
        crew.agents.clone(),
        crew.run_config(),
        log.clone(),
    ));
    let tools = delegation_tools(&coworkers);

    let final_expectation = tasks
        .last()
        .map(|t| t.expected_output.as_str())
        .unwrap_or_default();
    let prompt = task_prompt(&backlog_prompt(tasks, crew), final_expectation, None);

    let ctx = RunContext::new().with_agent_name(manager.role());
    let summary = format!("{} tasks managed by {}", tasks.len(), manager.role());
    hooks.on_task_start(&ctx, 0, &summary).await;
    log.invoked(Invocation::new(manager.role(), Purpose::Manage));

    let span = info_span!(
        "task",
        task.backlog = tasks.len(),
        task.agent = %manager.role(),
    );
    let output = Runner::run(manager, prompt, crew.run_config().extra_tools(tools))
        .instrument(span)
        .await?;
    hooks.on_task_end(&ctx, 0, &output.text).await;

    let (invocations, tasks_output) = log.drain();
    let usage = output.usage + tasks_output.iter().map(|o| o.usage).sum::<Usage>();

    Ok(CrewOutput {
        run_id,
        process: Process::Hierarchical,
        raw: output.text,
        tasks_output,
        invocations,
        usage,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::agent::Agent;
    use crate::chat::SharedChatProvider;
    use crate::crew::Task;
    use crate::llms::MockProvider;

    #[test]
    fn backlog_lists_coworkers_and_tasks() {
        let provider: SharedChatProvider = Arc::new(MockProvider::new());
        let guide = Agent::builder("Local Tour Guide")
            .goal("Know the city")
            .provider(Arc::clone(&provider))
            .build_shared()
            .unwrap();
        let manager = Agent::builder("Crew Manager")
            .provider(provider)
            .build_shared()
            .unwrap();
        let crew = Crew::builder()
            .agent(guide.clone())
            .task(Task::new("Pick a city").name("identify_city"))
            .task(
                Task::new("Describe it")
                    .expected_output("A guide")
                    .agent(guide),
            )
            .process(Process::Hierarchical)
            .manager(manager)
            .build()
            .unwrap();
        let rendered: Vec<RenderedTask> = crew
            .tasks()
            .iter()
            .enumerate()
            .map(|(i, t)| t.render(i, &HashMap::new()).unwrap())
            .collect();

        let prompt = backlog_prompt(&rendered, &crew);
        assert!(prompt.contains("- Local Tour Guide: Know the city"));
        assert!(prompt.contains("Task 1 (identify_city):\nPick a city"));
        assert!(prompt.contains("Task 2:\nDescribe it\nExpected output: A guide"));
        assert!(prompt.contains("Suggested coworker: Local Tour Guide"));
        assert!(prompt.contains("delegate_work"));
    }
}
