//! Persona and task prompt rendering.

use super::Agent;

/// Sent as the last user message when an agent runs out of steps.
pub(crate) const FORCE_FINAL_ANSWER: &str = "Now it's time you MUST give your absolute best \
final answer. Stop using any tools and return your complete final answer as plain text.";

/// Renders the system prompt of an agent from its persona.
///
/// ```text
/// You are {role}. {backstory}
/// Your personal goal is: {goal}
/// ```
#[must_use]
pub fn system_prompt(agent: &Agent) -> String {
    let mut prompt = format!("You are {}.", agent.role());
    if !agent.backstory().is_empty() {
        prompt.push(' ');
        prompt.push_str(agent.backstory());
    }
    if !agent.goal().is_empty() {
        prompt.push_str("\nYour personal goal is: ");
        prompt.push_str(agent.goal());
    }
    if !agent.tools().is_empty() {
        prompt.push_str(
            "\nUse the tools available to you when they help. Once you know the answer, \
             reply with your final answer only.",
        );
    }
    prompt
}

/// Renders the user prompt for one unit of work.
///
/// The expected output and the context block are appended only when present.
#[must_use]
pub fn task_prompt(description: &str, expected_output: &str, context: Option<&str>) -> String {
    let mut prompt = description.trim().to_owned();
    if !expected_output.trim().is_empty() {
        prompt.push_str("\n\nThis is the expected criteria for your final answer: ");
        prompt.push_str(expected_output.trim());
        prompt.push_str("\nYou MUST return the actual complete content as the final answer, not a summary.");
    }
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(context);
    }
    prompt
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llms::MockProvider;
    use crate::tools::CalculatorTool;

    #[test]
    fn system_prompt_renders_persona() {
        let agent = Agent::builder("Local Tour Guide")
            .goal("Provide the BEST insights about the selected city")
            .backstory("A knowledgeable local guide.")
            .provider(Arc::new(MockProvider::new()))
            .build()
            .unwrap();

        assert_eq!(
            system_prompt(&agent),
            "You are Local Tour Guide. A knowledgeable local guide.\n\
             Your personal goal is: Provide the BEST insights about the selected city"
        );
    }

    #[test]
    fn system_prompt_mentions_tools_when_present() {
        let agent = Agent::builder("Expert Travel Agent")
            .tool(CalculatorTool)
            .provider(Arc::new(MockProvider::new()))
            .build()
            .unwrap();
        let prompt = system_prompt(&agent);
        assert!(prompt.starts_with("You are Expert Travel Agent."));
        assert!(prompt.contains("tools"));
    }

    #[test]
    fn task_prompt_sections() {
        let bare = task_prompt("Pick a city.", "", None);
        assert_eq!(bare, "Pick a city.");

        let full = task_prompt("Plan the trip.", "A 7-day itinerary", Some("Lisbon was chosen."));
        assert!(full.starts_with("Plan the trip."));
        assert!(full.contains("expected criteria for your final answer: A 7-day itinerary"));
        assert!(full.ends_with("This is the context you're working with:\nLisbon was chosen."));
    }

    #[test]
    fn blank_context_is_omitted() {
        let prompt = task_prompt("Plan.", "", Some("   "));
        assert!(!prompt.contains("context"));
    }
}
