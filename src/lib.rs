//! Baton - Multi-Agent Reasoning with Handoffs
//!
//! A ReAct-style reasoning loop for individual agents, plus an orchestrator
//! that lets agents pass a task to one another through handoff requests
//! embedded in their final answers.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Provider abstraction with Ollama and scripted backends
//! - **Tools**: Tool trait and registry feeding the action catalog
//! - **Agent**: Reasoning loop, reply parser, prompt assembly, dispatch
//! - **Handoff**: Handoff codec, agent registry, chain orchestrator
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use baton::agent::{ActionDispatcher, AgentDefinition, ReactExecutor};
//! use baton::handoff::{AgentRegistry, HandoffOrchestrator, OrchestratorSettings};
//! use baton::llm::ScriptedProvider;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = Arc::new(ScriptedProvider::with_replies([
//!         "[HANDOFF:Billing|refund request] refund order 7",
//!         "Final Answer: Refund issued",
//!     ]));
//!     let registry = Arc::new(AgentRegistry::new());
//!     registry.register(AgentDefinition::new("Triage")).unwrap();
//!     registry.register(AgentDefinition::new("Billing")).unwrap();
//!
//!     let executor = ReactExecutor::new(llm, ActionDispatcher::without_tools());
//!     let orchestrator =
//!         HandoffOrchestrator::new(registry, executor, OrchestratorSettings::default());
//!
//!     let outcome = orchestrator
//!         .run("Triage", "I was charged twice", &CancellationToken::new())
//!         .await;
//!     println!("{} via {}", outcome.final_answer.clone().unwrap_or_default(), outcome.path());
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod handoff;
pub mod llm;
pub mod runtime;
pub mod tools;

// Re-export commonly used items
pub use cli::Repl;
pub use core::{BatonError, Config, FailureKind, Result};
pub use handoff::{HandoffOrchestrator, HandoffOutcome};
pub use runtime::Runtime;
