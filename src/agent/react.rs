//! Reasoning loop
//!
//! Implements the ReAct cycle for a single agent: assemble the prompt, ask
//! the model, parse the reply, run the chosen action, record the step. Each
//! iteration yields [`StepOutcome::Continue`] or a terminal outcome; the loop
//! stops at the first terminal one.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::agent::conversation::MemorySink;
use crate::agent::definition::AgentDefinition;
use crate::agent::dispatcher::ActionDispatcher;
use crate::agent::observer::{ExecutionObserver, TracingObserver};
use crate::agent::parser::{parse_reply, ParsedReply};
use crate::agent::prompt;
use crate::agent::session::{ExecutionResult, SessionContext, Step};
use crate::core::{ActionSpec, FailureKind};
use crate::llm::{GenerateOptions, LLMProvider};

/// Result of one iteration
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// No final answer yet
    Continue,
    /// The loop is over
    Terminal(Terminal),
}

/// How a loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    Success(String),
    Failed(FailureKind, String),
}

/// Pick the final answer out of a parsed reply, if there is one.
///
/// In order: a non-empty `Final Answer:`; a thought when no action was
/// chosen; the whole reply when it carries no labels at all.
pub fn select_final_answer(parsed: &ParsedReply, raw: &str) -> Option<String> {
    if let Some(answer) = parsed.final_answer.as_deref().filter(|a| !a.is_empty()) {
        return Some(answer.to_string());
    }

    if parsed.action_name().is_none() {
        if let Some(thought) = parsed.thought.as_deref().filter(|t| !t.is_empty()) {
            return Some(thought.to_string());
        }
    }

    let unlabeled =
        parsed.action.is_none() && parsed.thought.is_none() && parsed.final_answer.is_none();
    let raw = raw.trim();
    if unlabeled && !raw.is_empty() {
        return Some(raw.to_string());
    }

    None
}

/// The earliest wall-clock limit on a loop and the failure it produces
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    kind: FailureKind,
}

impl Deadline {
    /// Earliest of the hop and chain deadlines; a tie goes to the chain
    fn earliest(hop: Option<Instant>, chain: Option<Instant>) -> Option<Self> {
        let hop = hop.map(|at| Deadline {
            at,
            kind: FailureKind::HopTimeout,
        });
        let chain = chain.map(|at| Deadline {
            at,
            kind: FailureKind::ChainTimeout,
        });
        match (hop, chain) {
            (Some(h), Some(c)) => Some(if h.at < c.at { h } else { c }),
            (h, c) => h.or(c),
        }
    }

    fn failure(&self, agent: &str, steps: usize) -> Terminal {
        let message = match self.kind {
            FailureKind::ChainTimeout => format!(
                "chain time budget ran out in agent '{}' after {} steps",
                agent, steps
            ),
            _ => format!(
                "agent '{}' exceeded its time budget after {} steps",
                agent, steps
            ),
        };
        Terminal::Failed(self.kind, message)
    }
}

/// Sleep until the deadline, or forever when there is none
async fn expiry(deadline: Option<Deadline>) -> Deadline {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(deadline.at).await;
            deadline
        }
        None => std::future::pending().await,
    }
}

/// Drives one agent's reasoning loop
pub struct ReactExecutor {
    llm: Arc<dyn LLMProvider>,
    dispatcher: ActionDispatcher,
    memory: Option<Arc<dyn MemorySink>>,
    observer: Arc<dyn ExecutionObserver>,
    options: GenerateOptions,
    max_steps: usize,
    hop_timeout: Option<Duration>,
}

impl ReactExecutor {
    /// Create an executor with a 10 step budget and tracing observer
    pub fn new(llm: Arc<dyn LLMProvider>, dispatcher: ActionDispatcher) -> Self {
        Self {
            llm,
            dispatcher,
            memory: None,
            observer: Arc::new(TracingObserver),
            options: GenerateOptions::default(),
            max_steps: 10,
            hop_timeout: None,
        }
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemorySink>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Default step budget for agents without an override
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Wall-clock budget for one loop
    pub fn with_hop_timeout(mut self, timeout: Duration) -> Self {
        self.hop_timeout = Some(timeout);
        self
    }

    pub fn observer(&self) -> &Arc<dyn ExecutionObserver> {
        &self.observer
    }

    /// Step budget that applies to an agent
    pub fn max_steps_for(&self, agent: &AgentDefinition) -> usize {
        agent.max_steps().unwrap_or(self.max_steps)
    }

    /// Action catalog shown to an agent
    pub fn catalog_for(&self, agent: &AgentDefinition) -> Vec<ActionSpec> {
        self.dispatcher
            .tools()
            .map(|registry| registry.catalog(agent.tools()))
            .unwrap_or_default()
    }

    /// Run a fresh session for `input`
    pub async fn run_input(
        &self,
        agent: &AgentDefinition,
        input: &str,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let session = SessionContext::new(input, self.max_steps_for(agent));
        self.run(agent, session, cancel).await
    }

    /// Run the loop with the agent's own instructions
    pub async fn run(
        &self,
        agent: &AgentDefinition,
        session: SessionContext,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        self.run_until(agent, agent.instructions(), session, None, cancel)
            .await
    }

    /// Run the loop with replacement instructions under an outer deadline
    ///
    /// Both limits are checked at the top of each iteration and also bound
    /// the model call. Whichever fires first decides the failure kind:
    /// `HopTimeout` for the hop, `ChainTimeout` for `chain_deadline`.
    pub async fn run_until(
        &self,
        agent: &AgentDefinition,
        instructions: &str,
        mut session: SessionContext,
        chain_deadline: Option<Instant>,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let started = Instant::now();
        let deadline = Deadline::earliest(
            self.hop_timeout.and_then(|timeout| started.checked_add(timeout)),
            chain_deadline,
        );
        let catalog = self.catalog_for(agent);

        tracing::info!(
            agent = agent.name(),
            session_id = session.session_id(),
            max_steps = session.max_steps(),
            "starting reasoning loop"
        );

        let terminal = loop {
            if cancel.is_cancelled() {
                break Terminal::Failed(
                    FailureKind::Cancelled,
                    format!("cancelled before step {}", session.next_step_number()),
                );
            }

            if !session.has_budget() {
                break Terminal::Failed(
                    FailureKind::BudgetExceeded,
                    format!(
                        "no final answer after {} steps",
                        session.steps().len()
                    ),
                );
            }

            if let Some(d) = deadline.filter(|d| Instant::now() >= d.at) {
                break d.failure(agent.name(), session.steps().len());
            }

            match self
                .iterate(agent, instructions, &catalog, &mut session, deadline, cancel)
                .await
            {
                StepOutcome::Continue => continue,
                StepOutcome::Terminal(terminal) => break terminal,
            }
        };

        let result = match terminal {
            Terminal::Success(answer) => {
                self.remember(session.input(), &answer).await;
                ExecutionResult::success(session, answer, started.elapsed())
            }
            Terminal::Failed(kind, message) => {
                ExecutionResult::failure(session, kind, message, started.elapsed())
            }
        };

        self.observer.loop_finished(agent.name(), &result);
        result
    }

    /// One pass of prompt, model call, parse, act, record
    async fn iterate(
        &self,
        definition: &AgentDefinition,
        instructions: &str,
        catalog: &[ActionSpec],
        session: &mut SessionContext,
        deadline: Option<Deadline>,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        let agent = definition.name();
        let number = session.next_step_number();
        self.observer
            .step_started(agent, session.session_id(), number);

        let messages = prompt::assemble(session, instructions, catalog);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return StepOutcome::Terminal(Terminal::Failed(
                    FailureKind::Cancelled,
                    format!("cancelled during step {}", number),
                ));
            }
            expired = expiry(deadline) => {
                return StepOutcome::Terminal(expired.failure(agent, session.steps().len()));
            }
            response = self.llm.chat(&messages, &self.options) => response,
        };

        let reply = match response {
            Ok(response) => {
                if let Some(usage) = response.usage {
                    tracing::debug!(
                        agent,
                        step = number,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "model usage"
                    );
                }
                response.content
            }
            Err(e) => {
                return StepOutcome::Terminal(Terminal::Failed(
                    FailureKind::ProviderFailure,
                    e.to_string(),
                ));
            }
        };

        if cancel.is_cancelled() {
            return StepOutcome::Terminal(Terminal::Failed(
                FailureKind::Cancelled,
                format!("cancelled during step {}", number),
            ));
        }

        let parsed = parse_reply(&reply);

        let observation = match parsed.action_name() {
            Some(action) => {
                let input = parsed.action_input.as_deref().unwrap_or_default();
                Some(
                    self.dispatcher
                        .dispatch(action, input, definition.tools())
                        .await,
                )
            }
            None => None,
        };

        let answer = select_final_answer(&parsed, &reply);

        let step = Step {
            number,
            raw_output: reply,
            thought: parsed.thought,
            action: parsed.action,
            action_input: parsed.action_input,
            observation,
        };
        self.observer
            .step_finished(agent, session.session_id(), &step);
        session.push_step(step);

        if cancel.is_cancelled() {
            return StepOutcome::Terminal(Terminal::Failed(
                FailureKind::Cancelled,
                format!("cancelled after step {}", number),
            ));
        }

        match answer {
            Some(answer) => StepOutcome::Terminal(Terminal::Success(answer)),
            None => StepOutcome::Continue,
        }
    }

    /// Store the exchange; memory failures never fail the run
    async fn remember(&self, input: &str, answer: &str) {
        let Some(memory) = self.memory.as_ref() else {
            return;
        };

        for (role, content) in [("user", input), ("assistant", answer)] {
            if let Err(e) = memory.append_message(role, content).await {
                tracing::warn!(error = %e, role, "failed to append to conversation memory");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BatonError, Result};
    use crate::llm::ScriptedProvider;
    use async_trait::async_trait;

    fn executor(provider: ScriptedProvider) -> ReactExecutor {
        ReactExecutor::new(Arc::new(provider), ActionDispatcher::without_tools())
    }

    struct FailingMemory;

    #[async_trait]
    impl MemorySink for FailingMemory {
        async fn append_message(&self, _role: &str, _content: &str) -> Result<()> {
            Err(BatonError::Other("memory offline".to_string()))
        }
    }

    #[test]
    fn test_final_answer_policy() {
        let parsed = parse_reply("Final Answer: 42");
        assert_eq!(select_final_answer(&parsed, "Final Answer: 42").as_deref(), Some("42"));

        let raw = "Thought: The answer is 7";
        assert_eq!(
            select_final_answer(&parse_reply(raw), raw).as_deref(),
            Some("The answer is 7")
        );

        let raw = "Thought: need data\nAction: search\nAction Input: x";
        assert_eq!(select_final_answer(&parse_reply(raw), raw), None);

        let raw = "  The sky is blue \n";
        assert_eq!(
            select_final_answer(&parse_reply(raw), raw).as_deref(),
            Some("The sky is blue")
        );

        let raw = "Final Answer:";
        assert_eq!(select_final_answer(&parse_reply(raw), raw), None);
    }

    #[test]
    fn test_earliest_deadline_wins() {
        let now = Instant::now();
        let soon = now + Duration::from_millis(10);
        let later = now + Duration::from_millis(20);

        let d = Deadline::earliest(Some(soon), Some(later)).unwrap();
        assert_eq!((d.at, d.kind), (soon, FailureKind::HopTimeout));

        let d = Deadline::earliest(Some(later), Some(soon)).unwrap();
        assert_eq!(d.kind, FailureKind::ChainTimeout);

        let d = Deadline::earliest(Some(soon), Some(soon)).unwrap();
        assert_eq!(d.kind, FailureKind::ChainTimeout);

        assert!(Deadline::earliest(None, None).is_none());
    }

    #[tokio::test]
    async fn test_chain_deadline_interrupts_model_call() {
        let exec = executor(
            ScriptedProvider::with_replies(["Final Answer: late"])
                .with_delay(Duration::from_millis(200)),
        )
        .with_hop_timeout(Duration::from_secs(5));
        let agent = AgentDefinition::new("solo");
        let session = SessionContext::new("slow", 5);
        let deadline = Instant::now() + Duration::from_millis(20);
        let result = exec
            .run_until(&agent, "Be brief.", session, Some(deadline), &CancellationToken::new())
            .await;

        assert_eq!(result.failure, Some(FailureKind::ChainTimeout));
        assert!(result.steps.is_empty());
        assert!(result.error.unwrap().contains("solo"));
    }

    #[tokio::test]
    async fn test_direct_final_answer() {
        let exec = executor(ScriptedProvider::with_replies(["Final Answer: 42"]));
        let agent = AgentDefinition::new("solo");
        let result = exec
            .run_input(&agent, "meaning of life?", &CancellationToken::new())
            .await;

        assert!(result.success);
        assert_eq!(result.final_answer.as_deref(), Some("42"));
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].number, 1);
    }

    #[tokio::test]
    async fn test_observation_feeds_next_prompt() {
        let provider = Arc::new(ScriptedProvider::with_replies([
            "Thought: look it up\nAction: lookup\nAction Input: capital of France",
            "Final Answer: Paris",
        ]));
        let exec = ReactExecutor::new(provider.clone(), ActionDispatcher::without_tools());
        let result = exec
            .run_input(&AgentDefinition::new("geo"), "Capital of France?", &CancellationToken::new())
            .await;

        assert!(result.success);
        assert_eq!(result.steps.len(), 2);
        let observation = result.steps[0].observation.clone().unwrap();
        assert!(observation.starts_with("[Mock lookup]"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1][1].content.contains(&format!("Observation: {}", observation)));
    }

    #[tokio::test]
    async fn test_provider_failure_is_terminal() {
        let provider = ScriptedProvider::new();
        provider.push_failure("rate limited");
        let result = executor(provider)
            .run_input(&AgentDefinition::new("a"), "hi", &CancellationToken::new())
            .await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::ProviderFailure));
        assert!(result.error.unwrap().contains("rate limited"));
        assert!(result.steps.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = executor(ScriptedProvider::with_replies(["Final Answer: x"]))
            .run_input(&AgentDefinition::new("a"), "hi", &cancel)
            .await;

        assert_eq!(result.failure, Some(FailureKind::Cancelled));
        assert!(result.steps.is_empty());
    }

    #[tokio::test]
    async fn test_memory_failure_is_swallowed() {
        let exec = executor(ScriptedProvider::with_replies(["Final Answer: ok"]))
            .with_memory(Arc::new(FailingMemory));
        let result = exec
            .run_input(&AgentDefinition::new("a"), "hi", &CancellationToken::new())
            .await;

        assert!(result.success);
        assert_eq!(result.final_answer.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_agent_step_override() {
        let exec = executor(ScriptedProvider::with_replies([
            "Action: search\nAction Input: a",
            "Action: search\nAction Input: b",
        ]))
        .with_max_steps(10);
        let agent = AgentDefinition::builder("tight").max_steps(1).build();
        let result = exec
            .run_input(&agent, "hi", &CancellationToken::new())
            .await;

        assert_eq!(result.failure, Some(FailureKind::BudgetExceeded));
        assert_eq!(result.steps.len(), 1);
    }
}
