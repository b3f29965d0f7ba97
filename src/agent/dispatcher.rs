//! Action dispatch
//!
//! Resolves an action name to a registered tool the agent may use, or to a
//! built-in mock when no such tool matches, and always returns observation
//! text. Tool failures become text so the loop can keep going.

use std::sync::Arc;

use crate::tools::ToolRegistry;

/// Turns an action into observation text
#[derive(Clone, Default)]
pub struct ActionDispatcher {
    tools: Option<Arc<ToolRegistry>>,
}

impl ActionDispatcher {
    /// Dispatcher backed by a tool registry
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools: Some(tools) }
    }

    /// Dispatcher that only knows the built-in mocks
    pub fn without_tools() -> Self {
        Self { tools: None }
    }

    pub fn tools(&self) -> Option<&Arc<ToolRegistry>> {
        self.tools.as_ref()
    }

    /// Execute an action and return its observation
    ///
    /// `allowed` is the agent's tool allow-list; empty allows every tool.
    /// A registered tool outside the list is treated as unregistered.
    pub async fn dispatch(&self, action: &str, input: &str, allowed: &[String]) -> String {
        let permitted = allowed.is_empty() || allowed.iter().any(|name| name == action);
        let tool = self
            .tools
            .as_ref()
            .and_then(|registry| registry.get(action))
            .filter(|_| permitted);

        if let Some(tool) = tool {
            tracing::debug!(action, "executing registered tool");
            let result = tool.execute(input).await;
            return if result.success {
                result.output
            } else {
                let error = result.error.unwrap_or_else(|| "unknown error".to_string());
                tracing::warn!(action, error = %error, "tool execution failed");
                format!("Error executing {}: {}", action, error)
            };
        }

        mock_observation(action, input)
    }
}

/// Placeholder behaviour for actions with no registered tool
fn mock_observation(action: &str, input: &str) -> String {
    match action.to_lowercase().as_str() {
        "search" => format!(
            "[Mock search] No search backend is configured. Query was: {}",
            input
        ),
        "calculate" => format!(
            "[Mock calculate] No calculator is configured. Expression was: {}",
            input
        ),
        "lookup" => format!(
            "[Mock lookup] No lookup source is configured. Key was: {}",
            input
        ),
        _ => format!(
            "No such action: '{}'. Use one of the available actions.",
            action
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolResult;
    use crate::tools::Tool;
    use async_trait::async_trait;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase the input"
        }

        async fn execute(&self, input: &str) -> ToolResult {
            ToolResult::success("upper", input.to_uppercase())
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "search"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn execute(&self, _input: &str) -> ToolResult {
            ToolResult::failure("search", "index offline")
        }
    }

    fn dispatcher_with(tool: Arc<dyn Tool>) -> ActionDispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(tool);
        ActionDispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_registered_tool() {
        let dispatcher = dispatcher_with(Arc::new(Upper));
        assert_eq!(dispatcher.dispatch("upper", "abc", &[]).await, "ABC");
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_text() {
        let dispatcher = dispatcher_with(Arc::new(Broken));
        let observation = dispatcher.dispatch("search", "q", &[]).await;
        assert_eq!(observation, "Error executing search: index offline");
    }

    #[tokio::test]
    async fn test_mock_fallback_is_case_insensitive() {
        let dispatcher = ActionDispatcher::without_tools();
        let observation = dispatcher.dispatch("Search", "q", &[]).await;
        assert!(observation.starts_with("[Mock search]"));
        assert!(observation.ends_with("q"));

        let observation = dispatcher.dispatch("CALCULATE", "1+1", &[]).await;
        assert!(observation.starts_with("[Mock calculate]"));
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let dispatcher = dispatcher_with(Arc::new(Upper));
        let observation = dispatcher.dispatch("teleport", "", &[]).await;
        assert!(observation.starts_with("No such action: 'teleport'"));
    }

    #[tokio::test]
    async fn test_tool_outside_allow_list_is_not_run() {
        let dispatcher = dispatcher_with(Arc::new(Upper));
        let allowed = vec!["clock".to_string()];
        let observation = dispatcher.dispatch("upper", "abc", &allowed).await;
        assert!(observation.starts_with("No such action: 'upper'"));

        let allowed = vec!["upper".to_string()];
        assert_eq!(dispatcher.dispatch("upper", "abc", &allowed).await, "ABC");
    }

    #[tokio::test]
    async fn test_hidden_tool_falls_back_to_mock() {
        let dispatcher = dispatcher_with(Arc::new(Broken));
        let allowed = vec!["upper".to_string()];
        let observation = dispatcher.dispatch("search", "q", &allowed).await;
        assert!(observation.starts_with("[Mock search]"));
    }
}
