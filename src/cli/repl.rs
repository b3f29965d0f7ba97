//! Interactive REPL for Baton
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};

use tokio_util::sync::CancellationToken;

use crate::agent::prompt::render_step;
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, Result};
use crate::handoff::HandoffOutcome;
use crate::runtime::Runtime;

/// Run a request, cancelling it if Ctrl+C arrives first
pub async fn run_cancellable(runtime: &Runtime, input: &str) -> HandoffOutcome {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling run");
                cancel.cancel();
            }
        }
    });

    let outcome = runtime.process(input, &cancel).await;
    watcher.abort();
    outcome
}

/// Render an outcome for the terminal
///
/// Failures always include the per-hop trace; successes only in verbose mode.
pub fn format_outcome(outcome: &HandoffOutcome, verbose: bool) -> String {
    let mut out = String::new();

    match (&outcome.final_answer, &outcome.error) {
        (Some(answer), _) if outcome.success => {
            out.push_str(&format!("{}\n\n", answer));
        }
        (_, error) => {
            out.push_str(&format!(
                "Error: {}\n\n",
                error.as_deref().unwrap_or("run failed")
            ));
        }
    }

    out.push_str(&format!(
        "[{}] {} step(s), {:.1}s{}",
        outcome.path(),
        outcome.total_steps(),
        outcome.elapsed.as_secs_f64(),
        if outcome.fallback_used { ", fallback used" } else { "" }
    ));

    if verbose || !outcome.success {
        for hop in &outcome.hops {
            out.push_str(&format!(
                "\n\n── {}{} ──",
                hop.agent,
                if hop.fallback { " (fallback)" } else { "" }
            ));
            for step in &hop.result.steps {
                out.push_str(&format!("\n#{} {}", step.number, render_step(step)));
            }
            if let Some(ref error) = hop.result.error {
                out.push_str(&format!("\n! {}", error));
            }
        }
    }

    out
}

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    runtime: Runtime,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            runtime: Runtime::new(config)?,
        })
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        print!("Connecting to Ollama...");
        io::stdout().flush()?;

        match self.runtime.initialize().await {
            Ok(()) => println!(" Ready!\n"),
            Err(e) => {
                println!("\n\nInitialization error: {}\n", e);
                return Ok(());
            }
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("[{}] You: ", self.runtime.entry_agent());
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.runtime).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Clear) => {
                    println!("Conversation cleared.\n");
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::Continue(input)) => {
                    let outcome = run_cancellable(&self.runtime, &input).await;
                    let verbose = self.runtime.config().agent.debug;
                    println!("\n{}\n", format_outcome(&outcome, verbose));
                }
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.runtime.config();

        println!("\nBaton - multi-agent reasoning with handoffs\n");
        println!("Ollama:  {}", config.ollama_url());
        println!("Model:   {}", config.model.name);
        println!(
            "Agents:  {}",
            self.runtime
                .agents()
                .iter()
                .map(|a| a.name().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
        println!("Commands: help, agents, use, status, clear, models, exit");
        println!("─────────────────────────────────────────────");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedProvider;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_format_success_hides_trace() {
        let provider = Arc::new(ScriptedProvider::with_replies(["Final Answer: 4"]));
        let runtime = Runtime::with_provider(Config::default(), provider).unwrap();
        let outcome = runtime.process("2+2?", &CancellationToken::new()).await;

        let text = format_outcome(&outcome, false);
        assert!(text.starts_with("4\n\n[assistant] 1 step(s)"));
        assert!(!text.contains("──"));
        assert!(format_outcome(&outcome, true).contains("── assistant ──"));
    }

    #[tokio::test]
    async fn test_format_failure_shows_trace() {
        let provider = ScriptedProvider::new();
        provider.push_failure("connection refused");
        let mut config = Config::default();
        config.handoff.fallback_to_entry = false;
        let runtime = Runtime::with_provider(config, Arc::new(provider)).unwrap();
        let outcome = runtime.process("hi", &CancellationToken::new()).await;

        let text = format_outcome(&outcome, false);
        assert!(text.starts_with("Error: provider failure"));
        assert!(text.contains("── assistant ──"));
        assert!(text.contains("connection refused"));
    }
}
