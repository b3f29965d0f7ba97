//! Agent definitions
//!
//! Static description of an agent: who it is, what it is told, and which
//! tools it may see.

use serde::{Deserialize, Serialize};

use crate::core::AgentEntry;

/// A named agent the orchestrator can dispatch to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Name of this agent
    name: String,
    /// Short summary shown to other agents that may hand off to it
    description: String,
    /// Instructions embedded in the system message
    instructions: String,
    /// Which tool names this agent can see (empty = all)
    tools: Vec<String>,
    /// Step budget override for this agent
    max_steps: Option<usize>,
}

/// Builder for creating AgentDefinitions
pub struct AgentDefinitionBuilder {
    name: String,
    description: Option<String>,
    instructions: Option<String>,
    tools: Vec<String>,
    max_steps: Option<usize>,
}

impl AgentDefinitionBuilder {
    /// Create a new builder with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            instructions: None,
            tools: Vec::new(),
            max_steps: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set allowed tools (empty = all tools allowed)
    pub fn tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    /// Override the step budget; zero is raised to one
    pub fn max_steps(mut self, max: usize) -> Self {
        self.max_steps = Some(max.max(1));
        self
    }

    /// Build the AgentDefinition
    pub fn build(self) -> AgentDefinition {
        let name = self.name.trim().to_string();
        AgentDefinition {
            instructions: self.instructions.unwrap_or_else(|| {
                format!(
                    "You are a helpful agent named '{}'. Complete the task you are given.",
                    name
                )
            }),
            description: self.description.unwrap_or_default(),
            tools: self.tools,
            max_steps: self.max_steps,
            name,
        }
    }
}

impl AgentDefinition {
    /// Create an agent with default instructions
    pub fn new(name: impl Into<String>) -> Self {
        AgentDefinitionBuilder::new(name).build()
    }

    /// Create a builder for more control
    pub fn builder(name: impl Into<String>) -> AgentDefinitionBuilder {
        AgentDefinitionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }
}

impl From<&AgentEntry> for AgentDefinition {
    fn from(entry: &AgentEntry) -> Self {
        let mut builder = AgentDefinition::builder(&entry.name)
            .description(&entry.description)
            .tools(entry.tools.clone());
        if !entry.instructions.trim().is_empty() {
            builder = builder.instructions(&entry.instructions);
        }
        if let Some(max) = entry.max_steps {
            builder = builder.max_steps(max);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let agent = AgentDefinition::builder("Billing")
            .description("Handles refunds")
            .instructions("You resolve billing issues.")
            .max_steps(3)
            .build();

        assert_eq!(agent.name(), "Billing");
        assert_eq!(agent.description(), "Handles refunds");
        assert_eq!(agent.max_steps(), Some(3));
        assert!(agent.tools().is_empty());
    }

    #[test]
    fn test_default_instructions_name_the_agent() {
        let agent = AgentDefinition::new(" Triage ");
        assert_eq!(agent.name(), "Triage");
        assert!(agent.instructions().contains("'Triage'"));
    }

    #[test]
    fn test_from_config_entry() {
        let entry = AgentEntry {
            name: "Research".to_string(),
            description: "Finds facts".to_string(),
            instructions: "Look things up.".to_string(),
            tools: vec!["search".to_string()],
            max_steps: Some(4),
        };
        let agent = AgentDefinition::from(&entry);
        assert_eq!(agent.instructions(), "Look things up.");
        assert_eq!(agent.tools(), ["search".to_string()]);
        assert_eq!(agent.max_steps(), Some(4));
    }
}
