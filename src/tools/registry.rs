//! Tool registry - manages and looks up invocable tools
//!
//! Central hub for registering tools and describing them to the model.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::ActionSpec;
use crate::tools::Tool;

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    /// Tools indexed by name
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "replaced previously registered tool");
        }
    }

    /// Look up a tool by exact name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Describe tools for a prompt catalog
    ///
    /// An empty allow-list exposes every tool. Unknown names in the
    /// allow-list are ignored.
    pub fn catalog(&self, allowed: &[String]) -> Vec<ActionSpec> {
        self.names()
            .into_iter()
            .filter(|name| allowed.is_empty() || allowed.contains(name))
            .filter_map(|name| {
                self.tools
                    .get(&name)
                    .map(|tool| ActionSpec::new(name.clone(), tool.description()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolResult;
    use async_trait::async_trait;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        async fn execute(&self, input: &str) -> ToolResult {
            ToolResult::success(self.0, input)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("weather")));
        registry.register(Arc::new(NamedTool("clock")));

        assert_eq!(registry.get("weather").unwrap().name(), "weather");
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.names(), vec!["clock", "weather"]);
    }

    #[test]
    fn test_catalog_allow_list() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("weather")));
        registry.register(Arc::new(NamedTool("clock")));

        assert_eq!(registry.catalog(&[]).len(), 2);

        let catalog = registry.catalog(&["clock".to_string(), "nope".to_string()]);
        assert_eq!(catalog, vec![ActionSpec::new("clock", "test tool")]);
    }
}
