//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::core::Result;
use crate::runtime::Runtime;

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// Clear history
    Clear,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, runtime: &mut Runtime) -> Result<CommandResult> {
    let input = input.trim();
    let (cmd, args) = match input.split_once(' ') {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (input, ""),
    };
    let cmd = cmd.to_lowercase();

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "clear" | "reset" => {
            runtime.clear_history().await;
            Ok(CommandResult::Clear)
        }

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "agents" => Ok(CommandResult::Handled(agents_text(runtime))),

        "use" => {
            if args.is_empty() {
                return Ok(CommandResult::Handled(format!(
                    "Usage: use <agent>\nCurrent entry agent: {}",
                    runtime.entry_agent()
                )));
            }
            match runtime.set_entry_agent(args) {
                Ok(()) => Ok(CommandResult::Handled(format!(
                    "Entry agent set to: {}",
                    runtime.entry_agent()
                ))),
                Err(e) => Ok(CommandResult::Handled(format!(
                    "{}. Type 'agents' to list them.",
                    e
                ))),
            }
        }

        "models" => {
            let models = runtime.list_models().await?;
            let output = format!(
                "Available models:\n{}\n\nCurrent: {}",
                models
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n"),
                runtime.config().model.name
            );
            Ok(CommandResult::Handled(output))
        }

        "save" => {
            let path = runtime.config().save()?;
            Ok(CommandResult::Handled(format!(
                "Configuration saved to {}",
                path.display()
            )))
        }

        "status" => {
            let config = runtime.config();
            let status = format!(
                "Baton Status:\n\
                 ─────────────────────────────\n\
                 Model:        {}\n\
                 Entry agent:  {}\n\
                 Agents:       {}\n\
                 Max steps:    {}\n\
                 Max depth:    {}\n\
                 History:      {} messages\n\
                 Debug:        {}",
                config.model.name,
                runtime.entry_agent(),
                runtime.agents().len(),
                config.agent.max_steps,
                config.handoff.max_depth,
                runtime.conversation_length().await,
                if config.agent.debug { "on" } else { "off" }
            );
            Ok(CommandResult::Handled(status))
        }

        _ => {
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

fn agents_text(runtime: &Runtime) -> String {
    let lines = runtime
        .agents()
        .iter()
        .map(|agent| {
            let marker = if agent.name() == runtime.entry_agent() { "*" } else { " " };
            if agent.description().is_empty() {
                format!("{} {}", marker, agent.name())
            } else {
                format!("{} {} - {}", marker, agent.name(), agent.description())
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("Agents (* = entry):\n{}", lines)
}

/// Generate help text
fn help_text() -> String {
    r#"Baton Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Baton
  clear, reset     Clear conversation history
  status           Show current configuration
  agents           List registered agents
  use <agent>      Start new requests at <agent>
  models           List available Ollama models
  save             Write the current configuration to disk

Keyboard Shortcuts:
  Ctrl+C           Cancel the running request
  Ctrl+D           Exit Baton

Tips:
  - Agents hand work to each other with [HANDOFF:Name|reason] input
  - Define agents under [[agents]] in ~/.config/baton/config.toml
─────────────────────────────────────────────"#
        .to_string()
}
