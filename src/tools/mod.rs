//! Tools module - invocable capabilities for the reasoning loop
//!
//! A tool takes the raw `Action Input:` text and returns a [`ToolResult`].

pub mod registry;

use async_trait::async_trait;

use crate::core::ToolResult;

pub use registry::ToolRegistry;

/// A capability the model can invoke by name
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses after `Action:`
    fn name(&self) -> &str;

    /// Description shown in the prompt catalog
    fn description(&self) -> &str;

    /// Run the tool on the action input
    async fn execute(&self, input: &str) -> ToolResult;
}
