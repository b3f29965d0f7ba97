//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction, an Ollama backend, and a scripted
//! provider for deterministic runs.

pub mod ollama;
pub mod scripted;
pub mod traits;

pub use ollama::OllamaClient;
pub use scripted::ScriptedProvider;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
