//! Agent module - reasoning loop and everything it needs
//!
//! Contains the per-agent ReAct executor, reply parsing, prompt assembly,
//! action dispatch, and conversation memory.

pub mod conversation;
pub mod definition;
pub mod dispatcher;
pub mod observer;
pub mod parser;
pub mod prompt;
pub mod react;
pub mod session;

pub use conversation::{Conversation, MemorySink};
pub use definition::{AgentDefinition, AgentDefinitionBuilder};
pub use dispatcher::ActionDispatcher;
pub use observer::{ExecutionObserver, NoopObserver, TracingObserver};
pub use parser::{parse_reply, ParsedReply};
pub use react::{select_final_answer, ReactExecutor, StepOutcome, Terminal};
pub use session::{ExecutionResult, SessionContext, Step};
