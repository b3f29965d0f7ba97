//! Configuration management for Baton
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/baton/config.toml

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{BatonError, Result};

/// Main configuration for Baton
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    pub ollama: OllamaConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Reasoning loop configuration
    pub agent: AgentConfig,
    /// Handoff chain limits
    #[serde(default)]
    pub handoff: HandoffConfig,
    /// Agent that receives input when none is named
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_agent: Option<String>,
    /// Agents available for dispatch and handoff
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model selection and sampling options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model used for every agent's reasoning loop
    /// Default: qwen3:8b
    pub name: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens per reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Reasoning loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum reasoning steps per agent loop
    /// Default: 10
    pub max_steps: usize,
    /// Maximum conversation memory length
    /// Default: 1000
    pub max_history: usize,
    /// Whether to show debug output
    pub debug: bool,
}

/// Handoff chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Maximum number of agent switches per chain
    /// Default: 5
    pub max_depth: usize,
    /// Wall-clock budget for one agent's loop
    pub hop_timeout_secs: u64,
    /// Wall-clock budget for the whole chain
    pub total_timeout_secs: u64,
    /// Allow a chain to revisit an agent
    pub allow_cycles: bool,
    /// Retry once on the entry agent when the chain fails
    pub fallback_to_entry: bool,
}

/// An agent as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    /// Tool names this agent may see (empty = all)
    #[serde(default)]
    pub tools: Vec<String>,
    /// Overrides `agent.max_steps` for this agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| v == "true" || v == "1")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            model: ModelConfig::default(),
            agent: AgentConfig::default(),
            handoff: HandoffConfig::default(),
            entry_agent: None,
            agents: Vec::new(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: env::var("BATON_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string()),
            temperature: 0.2,
            max_tokens: None,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            max_history: 1000,
            debug: env_flag("BATON_DEBUG").unwrap_or(false),
        }
    }
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            hop_timeout_secs: 120,
            total_timeout_secs: 600,
            allow_cycles: false,
            fallback_to_entry: true,
        }
    }
}

impl HandoffConfig {
    pub fn hop_timeout(&self) -> Duration {
        Duration::from_secs(self.hop_timeout_secs)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("baton")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from the default file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(BatonError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| BatonError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| BatonError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check limits and agent names
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_steps == 0 {
            return Err(BatonError::config("agent.max_steps must be at least 1"));
        }
        if self.handoff.max_depth == 0 {
            return Err(BatonError::config("handoff.max_depth must be at least 1"));
        }
        if self.handoff.hop_timeout_secs == 0 || self.handoff.total_timeout_secs == 0 {
            return Err(BatonError::config("handoff timeouts must be positive"));
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(BatonError::config("agent names must not be empty"));
            }
            if agent.max_steps == Some(0) {
                return Err(BatonError::config(format!(
                    "agent '{}' max_steps must be at least 1",
                    agent.name
                )));
            }
            if !seen.insert(agent.name.to_lowercase()) {
                return Err(BatonError::config(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
        }

        if let Some(ref entry) = self.entry_agent {
            if !self.agents.is_empty() && !seen.contains(&entry.to_lowercase()) {
                return Err(BatonError::config(format!(
                    "entry_agent '{}' is not defined",
                    entry
                )));
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| BatonError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| BatonError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| BatonError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }
}
