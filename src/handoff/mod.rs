//! Handoff module - moving a task between agents
//!
//! The codec recognizes handoff requests in an agent's final answer, the
//! registry resolves target names, and the orchestrator runs the chain.

pub mod codec;
pub mod orchestrator;
pub mod registry;

pub use codec::{HandoffCodec, HandoffRequest, HANDOFF_PREFIX};
pub use orchestrator::{HandoffOrchestrator, HandoffOutcome, HopRecord, OrchestratorSettings};
pub use registry::AgentRegistry;
