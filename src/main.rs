//! Baton - multi-agent reasoning with handoffs
//!
//! Main entry point for the CLI application.

use clap::Parser;
use baton::cli::{format_outcome, run_cancellable};
use baton::{Config, Repl, Runtime};

/// Baton - multi-agent reasoning with handoffs
#[derive(Parser, Debug)]
#[command(name = "baton")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Agent that receives the request
    #[arg(long, short = 'a')]
    agent: Option<String>,

    /// Ollama model used by every agent
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Reasoning steps per agent
    #[arg(long)]
    max_steps: Option<usize>,

    /// Maximum number of handoffs per request
    #[arg(long)]
    max_depth: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load();

    if let Some(ref model) = args.model {
        config.model.name = model.clone();
    }
    if let Some(ref agent) = args.agent {
        config.entry_agent = Some(agent.clone());
    }
    if let Some(max_steps) = args.max_steps {
        config.agent.max_steps = max_steps;
    }
    if let Some(max_depth) = args.max_depth {
        config.handoff.max_depth = max_depth;
    }
    if args.debug {
        config.agent.debug = true;
    }

    let default_filter = if config.agent.debug { "baton=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let runtime = Runtime::new(config)?;
        runtime.initialize().await?;

        let outcome = run_cancellable(&runtime, &prompt).await;
        println!("{}", format_outcome(&outcome, runtime.config().agent.debug));
        if !outcome.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config)?;
    repl.run().await?;

    Ok(())
}
