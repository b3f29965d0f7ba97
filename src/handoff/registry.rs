//! Agent registry: name → definition lookup shared across runs.
//!
//! Names are normalized to lowercase for case-insensitive matching, so a
//! model writing `[HANDOFF:billing]` reaches the agent registered as
//! `Billing`. Backed by a `DashMap` so concurrent lookups never wait on a
//! whole-map lock.

use dashmap::DashMap;
use std::sync::Arc;

use crate::agent::AgentDefinition;
use crate::core::{BatonError, Result};

/// Concurrent registry of agent definitions
#[derive(Default)]
pub struct AgentRegistry {
    agents: DashMap<String, Arc<AgentDefinition>>,
}

impl AgentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Errors if the name is already taken.
    pub fn register(&self, agent: AgentDefinition) -> Result<Arc<AgentDefinition>> {
        let key = agent.name().to_lowercase();
        if key.is_empty() {
            return Err(BatonError::config("agent name must not be empty"));
        }

        let agent = Arc::new(agent);
        match self.agents.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                Err(BatonError::DuplicateAgent(existing.get().name().to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(agent.clone());
                tracing::debug!(agent = agent.name(), "registered agent");
                Ok(agent)
            }
        }
    }

    /// Look up an agent by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<Arc<AgentDefinition>> {
        self.agents
            .get(&name.trim().to_lowercase())
            .map(|r| r.value().clone())
    }

    /// All agents, sorted by name.
    pub fn list(&self) -> Vec<Arc<AgentDefinition>> {
        let mut agents: Vec<Arc<AgentDefinition>> =
            self.agents.iter().map(|r| r.value().clone()).collect();
        agents.sort_by(|a, b| a.name().cmp(b.name()));
        agents
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = AgentRegistry::new();
        registry.register(AgentDefinition::new("Billing")).unwrap();

        assert_eq!(registry.get(" billing ").unwrap().name(), "Billing");
        assert_eq!(registry.get("BILLING").unwrap().name(), "Billing");
        assert!(registry.get("Support").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = AgentRegistry::new();
        registry.register(AgentDefinition::new("Billing")).unwrap();
        let err = registry.register(AgentDefinition::new("billing")).unwrap_err();
        assert!(matches!(err, BatonError::DuplicateAgent(name) if name == "Billing"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_sorted() {
        let registry = AgentRegistry::new();
        for name in ["Triage", "Billing", "Research"] {
            registry.register(AgentDefinition::new(name)).unwrap();
        }
        let names: Vec<String> = registry.list().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["Billing", "Research", "Triage"]);
    }

    #[test]
    fn test_concurrent_lookups_during_registration() {
        let registry = Arc::new(AgentRegistry::new());
        registry.register(AgentDefinition::new("Entry")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry
                        .register(AgentDefinition::new(format!("agent-{}", i)))
                        .unwrap();
                    for _ in 0..100 {
                        assert!(registry.get("entry").is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 9);
    }
}
