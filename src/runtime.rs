//! Runtime wiring
//!
//! Builds the provider, tool catalog, agent registry, memory, and
//! orchestrator from a [`Config`], and keeps the CLI's per-session state.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::agent::{ActionDispatcher, AgentDefinition, Conversation, ReactExecutor};
use crate::core::{BatonError, Config, Result};
use crate::handoff::{AgentRegistry, HandoffOrchestrator, HandoffOutcome, OrchestratorSettings};
use crate::llm::{GenerateOptions, LLMProvider, OllamaClient};
use crate::tools::ToolRegistry;

/// Name of the agent created when the config defines none
pub const DEFAULT_AGENT: &str = "assistant";

/// Everything needed to answer a request
pub struct Runtime {
    config: Config,
    ollama: Option<OllamaClient>,
    orchestrator: HandoffOrchestrator,
    memory: Arc<Mutex<Conversation>>,
    entry_agent: String,
}

impl Runtime {
    /// Create a runtime backed by the configured Ollama server
    pub fn new(config: Config) -> Result<Self> {
        let client = OllamaClient::from_config(&config)?;
        let mut runtime = Self::with_provider(config, Arc::new(client.clone()))?;
        runtime.ollama = Some(client);
        Ok(runtime)
    }

    /// Create a runtime around any provider
    pub fn with_provider(config: Config, llm: Arc<dyn LLMProvider>) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(build_registry(&config)?);
        let entry_agent = match config.entry_agent.as_deref() {
            Some(name) => registry
                .get(name)
                .map(|a| a.name().to_string())
                .ok_or_else(|| BatonError::config(format!("entry agent '{}' is not defined", name)))?,
            None => config
                .agents
                .first()
                .map(|a| a.name.trim().to_string())
                .unwrap_or_else(|| DEFAULT_AGENT.to_string()),
        };

        let memory = Arc::new(Mutex::new(Conversation::new(config.agent.max_history)));
        let options = GenerateOptions {
            temperature: Some(config.model.temperature),
            max_tokens: config.model.max_tokens,
            stop: None,
        };
        let executor = ReactExecutor::new(
            llm,
            ActionDispatcher::new(Arc::new(ToolRegistry::new())),
        )
        .with_memory(memory.clone())
        .with_options(options)
        .with_max_steps(config.agent.max_steps)
        .with_hop_timeout(config.handoff.hop_timeout());

        let orchestrator = HandoffOrchestrator::new(
            registry,
            executor,
            OrchestratorSettings::from(&config.handoff),
        );

        Ok(Self {
            config,
            ollama: None,
            orchestrator,
            memory,
            entry_agent,
        })
    }

    /// Check that Ollama is reachable and serves the configured model
    pub async fn initialize(&self) -> Result<()> {
        let Some(ref client) = self.ollama else {
            return Ok(());
        };

        let models = client.list_models().await?;
        tracing::debug!(?models, "available models");

        let wanted = &self.config.model.name;
        let found = models
            .iter()
            .any(|m| m == wanted || m.split(':').next() == Some(wanted.as_str()));
        if !found {
            return Err(BatonError::ModelNotFound(wanted.clone()));
        }
        Ok(())
    }

    /// Run a handoff chain from the current entry agent
    pub async fn process(&self, input: &str, cancel: &CancellationToken) -> HandoffOutcome {
        self.orchestrator.run(&self.entry_agent, input, cancel).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn entry_agent(&self) -> &str {
        &self.entry_agent
    }

    /// Switch the entry agent; the name is matched case-insensitively
    pub fn set_entry_agent(&mut self, name: &str) -> Result<()> {
        let agent = self
            .orchestrator
            .registry()
            .get(name)
            .ok_or_else(|| BatonError::config(format!("no agent named '{}'", name)))?;
        self.entry_agent = agent.name().to_string();
        Ok(())
    }

    pub fn agents(&self) -> Vec<Arc<AgentDefinition>> {
        self.orchestrator.registry().list()
    }

    pub async fn conversation_length(&self) -> usize {
        self.memory.lock().await.len()
    }

    pub async fn clear_history(&self) {
        self.memory.lock().await.clear();
    }

    /// Models served by Ollama
    pub async fn list_models(&self) -> Result<Vec<String>> {
        match self.ollama {
            Some(ref client) => client.list_models().await,
            None => Err(BatonError::provider("model listing needs an Ollama backend")),
        }
    }
}

/// Register the configured agents, or a single default one
fn build_registry(config: &Config) -> Result<AgentRegistry> {
    let registry = AgentRegistry::new();
    if config.agents.is_empty() {
        registry.register(
            AgentDefinition::builder(DEFAULT_AGENT)
                .description("General purpose assistant")
                .build(),
        )?;
        return Ok(registry);
    }

    for entry in &config.agents {
        registry.register(AgentDefinition::from(entry))?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AgentEntry;
    use crate::llm::ScriptedProvider;

    fn entry(name: &str) -> AgentEntry {
        AgentEntry {
            name: name.to_string(),
            description: String::new(),
            instructions: format!("You are {}.", name),
            tools: Vec::new(),
            max_steps: None,
        }
    }

    #[tokio::test]
    async fn test_default_agent_and_memory() {
        let provider = Arc::new(ScriptedProvider::with_replies(["Final Answer: hi there"]));
        let runtime = Runtime::with_provider(Config::default(), provider).unwrap();
        assert_eq!(runtime.entry_agent(), DEFAULT_AGENT);

        let outcome = runtime.process("hello", &CancellationToken::new()).await;
        assert!(outcome.success);
        assert_eq!(runtime.conversation_length().await, 2);

        runtime.clear_history().await;
        assert_eq!(runtime.conversation_length().await, 0);
    }

    #[test]
    fn test_entry_agent_from_config() {
        let mut config = Config::default();
        config.agents = vec![entry("Triage"), entry("Billing")];
        config.entry_agent = Some("triage".to_string());

        let mut runtime =
            Runtime::with_provider(config, Arc::new(ScriptedProvider::new())).unwrap();
        assert_eq!(runtime.entry_agent(), "Triage");
        assert_eq!(runtime.agents().len(), 2);

        runtime.set_entry_agent("BILLING").unwrap();
        assert_eq!(runtime.entry_agent(), "Billing");
        assert!(runtime.set_entry_agent("ghost").is_err());
    }

    #[test]
    fn test_first_agent_is_default_entry() {
        let mut config = Config::default();
        config.agents = vec![entry("Zeta"), entry("Alpha")];
        let runtime = Runtime::with_provider(config, Arc::new(ScriptedProvider::new())).unwrap();
        assert_eq!(runtime.entry_agent(), "Zeta");
    }

    #[tokio::test]
    async fn test_models_need_ollama() {
        let runtime =
            Runtime::with_provider(Config::default(), Arc::new(ScriptedProvider::new())).unwrap();
        assert!(runtime.list_models().await.is_err());
        assert!(runtime.initialize().await.is_ok());
    }
}
