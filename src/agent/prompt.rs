//! Prompt assembly
//!
//! Builds the system and user messages for one reasoning step from the
//! session so far, the agent's instructions, and its action catalog.

use crate::agent::session::{SessionContext, Step};
use crate::core::{ActionSpec, Message};

/// Output grammar the model is asked to follow
pub const FORMAT_INSTRUCTIONS: &str = "\
Use the following format:

Thought: think about what to do next
Action: the action to take, one of the available actions
Action Input: the input to the action
Observation: the result of the action
... (Thought/Action/Action Input/Observation can repeat)
Thought: I now know the final answer
Final Answer: the final answer to the original input";

/// Actions listed when an agent has no catalog of its own
pub fn placeholder_actions() -> Vec<ActionSpec> {
    vec![
        ActionSpec::new("search", "Search for information on a topic"),
        ActionSpec::new("calculate", "Evaluate a mathematical expression"),
        ActionSpec::new("lookup", "Look up a specific fact or definition"),
    ]
}

/// Render the system message
pub fn system_message(instructions: &str, actions: &[ActionSpec]) -> Message {
    let placeholder;
    let actions = if actions.is_empty() {
        placeholder = placeholder_actions();
        &placeholder
    } else {
        actions
    };

    let catalog = actions
        .iter()
        .map(|a| format!("- {}: {}", a.name, a.description))
        .collect::<Vec<_>>()
        .join("\n");

    Message::system(format!(
        "{}\n\n{}\n\nAvailable actions:\n{}",
        instructions.trim(),
        FORMAT_INSTRUCTIONS,
        catalog
    ))
}

/// Render one step as labeled lines, skipping absent fields
pub fn render_step(step: &Step) -> String {
    [
        ("Thought", &step.thought),
        ("Action", &step.action),
        ("Action Input", &step.action_input),
        ("Observation", &step.observation),
    ]
    .iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v)))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Render steps as blank-line separated blocks
pub fn render_steps(steps: &[Step]) -> String {
    steps
        .iter()
        .map(render_step)
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the user message: the input followed by every prior step
pub fn user_message(session: &SessionContext) -> Message {
    let history = render_steps(session.steps());
    if history.is_empty() {
        Message::user(session.input())
    } else {
        Message::user(format!("{}\n\n{}", session.input(), history))
    }
}

/// Both messages for the next model call
pub fn assemble(session: &SessionContext, instructions: &str, actions: &[ActionSpec]) -> Vec<Message> {
    vec![system_message(instructions, actions), user_message(session)]
}
