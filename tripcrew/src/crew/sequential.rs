//! Sequential process: every task in declared order, by its own agent.

use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::agent::prompts::task_prompt;
use crate::agent::{RunConfig, Runner};
use crate::callback::{NoopRunHooks, RunContext, RunHooks};
use crate::error::{CrewError, Result};
use crate::usage::Usage;

use super::config::Crew;
use super::output::{CrewOutput, Invocation, Purpose, RunLog, TaskOutput};
use super::process::Process;
use super::task::RenderedTask;

/// Separator between the outputs joined into a context block.
pub(crate) const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

/// Joins the outputs of `refs` into one context block.
pub(crate) fn context_block(outputs: &[TaskOutput], refs: &[usize]) -> Option<String> {
    let parts: Vec<&str> = refs
        .iter()
        .filter_map(|&i| outputs.get(i))
        .map(|o| o.raw.as_str())
        .collect();
    (!parts.is_empty()).then(|| parts.join(CONTEXT_SEPARATOR))
}

pub(super) async fn run(crew: &Crew, tasks: &[RenderedTask], run_id: Uuid) -> Result<CrewOutput> {
    let noop = NoopRunHooks;
    let hooks: &dyn RunHooks = crew.hooks.as_deref().unwrap_or(&noop);
    let log = RunLog::default();
    let mut outputs: Vec<TaskOutput> = Vec::with_capacity(tasks.len());

    for rendered in tasks {
        crew.cancel.check()?;

        let index = rendered.index;
        let task = &crew.tasks[index];
        let agent = task.agent.as_ref().ok_or(CrewError::UnassignedTask(index))?;

        let context = context_block(&outputs, &task.context_for(index));
        let prompt = task_prompt(
            &rendered.description,
            &rendered.expected_output,
            context.as_deref(),
        );

        let ctx = RunContext::new()
            .with_agent_name(agent.role())
            .with_task(index);
        hooks
            .on_task_start(&ctx, index, &rendered.description)
            .await;
        log.invoked(Invocation::new(agent.role(), Purpose::Task { index }));

        let span = info_span!(
            "task",
            task.index = index,
            task.name = rendered.name.as_deref().unwrap_or_default(),
            task.agent = %agent.role(),
        );
        let config: RunConfig = crew.run_config().task(index);
        let output = Runner::run(agent, prompt, config).instrument(span).await?;

        hooks.on_task_end(&ctx, index, &output.text).await;
        outputs.push(TaskOutput {
            task: Some(index),
            name: rendered.name.clone(),
            description: rendered.description.clone(),
            agent: output.agent,
            raw: output.text,
            usage: output.usage,
        });
    }

    let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
    let usage: Usage = outputs.iter().map(|o| o.usage).sum();
    let (invocations, _) = log.drain();

    Ok(CrewOutput {
        run_id,
        process: Process::Sequential,
        raw,
        tasks_output: outputs,
        invocations,
        usage,
    })
}
