//! Handoff orchestrator
//!
//! Runs the reasoning loop for the current agent and, whenever its final
//! answer decodes as a handoff request, validates the request and switches
//! to the target agent. A chain ends with an answer that is not a handoff,
//! or with a failure. One fallback re-dispatch is allowed per chain.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::agent::prompt::render_steps;
use crate::agent::{AgentDefinition, ExecutionResult, ReactExecutor, SessionContext};
use crate::core::{FailureKind, HandoffConfig};
use crate::handoff::codec::{HandoffCodec, HandoffRequest, HANDOFF_PREFIX};
use crate::handoff::registry::AgentRegistry;

/// Limits applied to a handoff chain
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Maximum number of agent switches
    pub max_depth: usize,
    /// Wall-clock budget for the whole chain, enforced inside each hop too
    pub total_timeout: Duration,
    /// Allow revisiting an agent
    pub allow_cycles: bool,
    /// Retry once when the chain fails
    pub fallback_to_entry: bool,
    /// Pass the source agent's steps along with decoded requests
    pub preserve_history: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&HandoffConfig::default())
    }
}

impl From<&HandoffConfig> for OrchestratorSettings {
    fn from(config: &HandoffConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            total_timeout: config.total_timeout(),
            allow_cycles: config.allow_cycles,
            fallback_to_entry: config.fallback_to_entry,
            preserve_history: false,
        }
    }
}

/// One agent's run inside a chain
#[derive(Debug, Clone, Serialize)]
pub struct HopRecord {
    pub agent: String,
    pub input: String,
    /// Set for the fallback re-dispatch
    pub fallback: bool,
    pub result: ExecutionResult,
}

/// Terminal value of a handoff chain
#[derive(Debug, Clone, Serialize)]
pub struct HandoffOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Agent that ran last
    pub final_agent: String,
    /// Entry agent followed by every switch target, in order
    pub visited: Vec<String>,
    /// Number of switches performed
    pub depth: usize,
    pub hops: Vec<HopRecord>,
    /// Every handoff request that was accepted
    pub handoffs: Vec<HandoffRequest>,
    pub fallback_used: bool,
    pub elapsed: Duration,
}

impl HandoffOutcome {
    /// The visited agents joined as a path
    pub fn path(&self) -> String {
        self.visited.join(" -> ")
    }

    /// Total reasoning steps across every hop
    pub fn total_steps(&self) -> usize {
        self.hops.iter().map(|h| h.result.steps.len()).sum()
    }
}

#[derive(Debug, Clone)]
struct ChainFailure {
    kind: FailureKind,
    message: String,
}

impl ChainFailure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Bookkeeping for one top-level call
struct ChainState {
    entry: Arc<AgentDefinition>,
    original_input: String,
    visited: Vec<String>,
    depth: usize,
    started: Instant,
    hops: Vec<HopRecord>,
    handoffs: Vec<HandoffRequest>,
    fallback_used: bool,
}

impl ChainState {
    fn new(entry: Arc<AgentDefinition>, original_input: &str) -> Self {
        Self {
            visited: vec![entry.name().to_string()],
            entry,
            original_input: original_input.to_string(),
            depth: 0,
            started: Instant::now(),
            hops: Vec::new(),
            handoffs: Vec::new(),
            fallback_used: false,
        }
    }

    fn has_visited(&self, name: &str) -> bool {
        self.visited.iter().any(|v| v.eq_ignore_ascii_case(name))
    }

    fn switch_to(&mut self, name: &str) {
        self.visited.push(name.to_string());
        self.depth += 1;
    }

    fn finish(self, answer: std::result::Result<String, ChainFailure>) -> HandoffOutcome {
        let final_agent = self
            .hops
            .last()
            .map(|h| h.agent.clone())
            .unwrap_or_else(|| self.entry.name().to_string());

        let (success, final_answer, error, failure) = match answer {
            Ok(answer) => (true, Some(answer), None, None),
            Err(failure) => (false, None, Some(failure.to_string()), Some(failure.kind)),
        };

        HandoffOutcome {
            success,
            final_answer,
            error,
            failure,
            final_agent,
            visited: self.visited,
            depth: self.depth,
            hops: self.hops,
            handoffs: self.handoffs,
            fallback_used: self.fallback_used,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Run one agent with this input
struct Dispatch {
    agent: Arc<AgentDefinition>,
    input: String,
    metadata: HashMap<String, serde_json::Value>,
    fallback: bool,
}

impl Dispatch {
    fn new(agent: Arc<AgentDefinition>, input: impl Into<String>) -> Self {
        Self {
            agent,
            input: input.into(),
            metadata: HashMap::new(),
            fallback: false,
        }
    }
}

enum ChainStep {
    Dispatch(Dispatch),
    /// `hop` indexes the record whose answer carried the request
    Validate {
        source: Arc<AgentDefinition>,
        hop: usize,
        request: HandoffRequest,
    },
    Done(String),
    Failed(ChainFailure),
}

/// Drives handoff chains across registered agents
pub struct HandoffOrchestrator {
    registry: Arc<AgentRegistry>,
    executor: ReactExecutor,
    settings: OrchestratorSettings,
}

impl HandoffOrchestrator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        executor: ReactExecutor,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            executor,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &ReactExecutor {
        &self.executor
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run a chain starting at `entry`
    pub async fn run(&self, entry: &str, input: &str, cancel: &CancellationToken) -> HandoffOutcome {
        let Some(entry_agent) = self.registry.get(entry) else {
            return self.reject_entry(entry, input);
        };

        tracing::info!(entry = entry_agent.name(), "starting handoff chain");
        let chain = ChainState::new(entry_agent.clone(), input);
        let first = ChainStep::Dispatch(Dispatch::new(entry_agent, input));
        self.drive(chain, first, cancel).await
    }

    /// Start a chain with a request issued on behalf of `source`
    ///
    /// The request goes through the same validation as one decoded from an
    /// agent's answer; `source` is the entry agent for fallback purposes.
    pub async fn run_request(
        &self,
        source: &str,
        request: HandoffRequest,
        cancel: &CancellationToken,
    ) -> HandoffOutcome {
        let Some(source_agent) = self.registry.get(source) else {
            return self.reject_entry(source, &request.input);
        };

        let mut chain = ChainState::new(source_agent.clone(), &request.input);
        let first = match self.validate(&chain, &request) {
            Ok(target) => {
                ChainStep::Dispatch(self.accept(&mut chain, &source_agent, None, request, target))
            }
            Err(failure) => self.recover(&mut chain, &source_agent, &request.input, failure),
        };
        self.drive(chain, first, cancel).await
    }

    fn reject_entry(&self, name: &str, input: &str) -> HandoffOutcome {
        let placeholder = Arc::new(AgentDefinition::new(name));
        let chain = ChainState::new(placeholder, input);
        chain.finish(Err(ChainFailure::new(
            FailureKind::UnknownHandoffTarget,
            format!("agent '{}' is not registered", name),
        )))
    }

    async fn drive(
        &self,
        mut chain: ChainState,
        first: ChainStep,
        cancel: &CancellationToken,
    ) -> HandoffOutcome {
        let mut state = first;

        loop {
            state = match state {
                ChainStep::Dispatch(dispatch) => self.dispatch(&mut chain, dispatch, cancel).await,
                ChainStep::Validate {
                    source,
                    hop,
                    request,
                } => match self.validate(&chain, &request) {
                    Ok(target) => {
                        ChainStep::Dispatch(self.accept(&mut chain, &source, Some(hop), request, target))
                    }
                    Err(failure) => {
                        let source_input = chain.hops[hop].input.clone();
                        self.recover(&mut chain, &source, &source_input, failure)
                    }
                },
                ChainStep::Done(answer) => {
                    let outcome = chain.finish(Ok(answer));
                    tracing::info!(
                        path = %outcome.path(),
                        depth = outcome.depth,
                        steps = outcome.total_steps(),
                        "handoff chain complete"
                    );
                    return outcome;
                }
                ChainStep::Failed(failure) => {
                    tracing::warn!(error = %failure, "handoff chain failed");
                    return chain.finish(Err(failure));
                }
            };
        }
    }

    /// Run the reasoning loop for one hop and decide what comes next
    async fn dispatch(
        &self,
        chain: &mut ChainState,
        dispatch: Dispatch,
        cancel: &CancellationToken,
    ) -> ChainStep {
        let Dispatch {
            agent,
            input,
            metadata,
            fallback,
        } = dispatch;

        let mut session = SessionContext::new(input.clone(), self.executor.max_steps_for(&agent))
            .with_metadata("agent", serde_json::json!(agent.name()));
        session.metadata.extend(metadata);

        let instructions = self.instructions_for(&agent);
        let chain_deadline = chain.started.checked_add(self.settings.total_timeout);
        let result = self
            .executor
            .run_until(&agent, &instructions, session, chain_deadline, cancel)
            .await;

        let next = if result.success {
            let answer = result.final_answer.clone().unwrap_or_default();
            match HandoffCodec::decode(&answer) {
                Some(request) => ChainStep::Validate {
                    source: agent.clone(),
                    hop: chain.hops.len(),
                    request: request.preserve_history(self.settings.preserve_history),
                },
                None => ChainStep::Done(answer),
            }
        } else {
            let failure = ChainFailure::new(
                result.failure.unwrap_or(FailureKind::ProviderFailure),
                format!(
                    "agent '{}' failed: {}",
                    agent.name(),
                    result.error.as_deref().unwrap_or_default()
                ),
            );
            ChainStep::Failed(failure)
        };

        chain.hops.push(HopRecord {
            agent: agent.name().to_string(),
            input: input.clone(),
            fallback,
            result,
        });

        match next {
            ChainStep::Failed(failure) => self.recover(chain, &agent, &input, failure),
            other => other,
        }
    }

    /// Check a request against the chain limits, in order
    fn validate(
        &self,
        chain: &ChainState,
        request: &HandoffRequest,
    ) -> std::result::Result<Arc<AgentDefinition>, ChainFailure> {
        let Some(target) = self.registry.get(&request.target) else {
            return Err(ChainFailure::new(
                FailureKind::UnknownHandoffTarget,
                format!("no agent named '{}'", request.target),
            ));
        };

        if chain.depth >= self.settings.max_depth {
            return Err(ChainFailure::new(
                FailureKind::DepthExceeded,
                format!(
                    "handoff to '{}' would exceed the depth limit of {}",
                    target.name(),
                    self.settings.max_depth
                ),
            ));
        }

        if !self.settings.allow_cycles && chain.has_visited(target.name()) {
            return Err(ChainFailure::new(
                FailureKind::CycleDetected,
                format!(
                    "agent '{}' already visited: {}",
                    target.name(),
                    chain.visited.join(" -> ")
                ),
            ));
        }

        let elapsed = chain.started.elapsed();
        if elapsed >= self.settings.total_timeout {
            return Err(ChainFailure::new(
                FailureKind::ChainTimeout,
                format!(
                    "chain ran for {:?}, limit is {:?}",
                    elapsed, self.settings.total_timeout
                ),
            ));
        }

        Ok(target)
    }

    /// Record an accepted handoff and build the target's dispatch
    fn accept(
        &self,
        chain: &mut ChainState,
        source: &AgentDefinition,
        hop: Option<usize>,
        request: HandoffRequest,
        target: Arc<AgentDefinition>,
    ) -> Dispatch {
        chain.switch_to(target.name());
        self.executor
            .observer()
            .handoff(source.name(), target.name(), chain.depth);

        let history = hop
            .filter(|_| request.preserve_history)
            .map(|i| render_steps(&chain.hops[i].result.steps))
            .filter(|h| !h.is_empty());
        let input = match history {
            Some(history) => format!(
                "{}\n\nPrevious agent ({}) worked through:\n{}",
                request.input,
                source.name(),
                history
            ),
            None => request.input.clone(),
        };

        let mut dispatch = Dispatch::new(target, input);
        dispatch.metadata = request.context.clone();
        dispatch
            .metadata
            .insert("handoff_source".to_string(), serde_json::json!(source.name()));
        dispatch
            .metadata
            .insert("handoff_depth".to_string(), serde_json::json!(chain.depth));
        if let Some(ref reason) = request.reason {
            dispatch
                .metadata
                .insert("handoff_reason".to_string(), serde_json::json!(reason));
        }

        chain.handoffs.push(request);
        dispatch
    }

    /// Turn a failure into the fallback dispatch, or into the final failure
    fn recover(
        &self,
        chain: &mut ChainState,
        source: &Arc<AgentDefinition>,
        source_input: &str,
        failure: ChainFailure,
    ) -> ChainStep {
        if !failure.kind.allows_fallback() {
            return ChainStep::Failed(failure);
        }

        if chain.fallback_used {
            return ChainStep::Failed(ChainFailure::new(
                FailureKind::FallbackExhausted,
                format!("fallback already attempted; last error was {}", failure),
            ));
        }

        if !self.settings.fallback_to_entry {
            return ChainStep::Failed(failure);
        }

        chain.fallback_used = true;
        let (agent, base_input) = if failure.kind == FailureKind::DepthExceeded {
            (source.clone(), source_input.to_string())
        } else {
            (chain.entry.clone(), chain.original_input.clone())
        };

        tracing::warn!(
            agent = agent.name(),
            error = %failure,
            "falling back after chain failure"
        );

        let mut dispatch = Dispatch::new(
            agent,
            format!(
                "{}\n\n[The previous attempt failed ({}). Answer this request directly.]",
                base_input, failure
            ),
        );
        dispatch.fallback = true;
        dispatch
            .metadata
            .insert("fallback_reason".to_string(), serde_json::json!(failure.kind));
        ChainStep::Dispatch(dispatch)
    }

    /// Agent instructions plus the handoff directory when other agents exist
    fn instructions_for(&self, agent: &AgentDefinition) -> String {
        let others: Vec<Arc<AgentDefinition>> = self
            .registry
            .list()
            .into_iter()
            .filter(|a| !a.name().eq_ignore_ascii_case(agent.name()))
            .collect();

        if others.is_empty() {
            return agent.instructions().to_string();
        }

        let directory = others
            .iter()
            .map(|a| {
                if a.description().is_empty() {
                    format!("- {}", a.name())
                } else {
                    format!("- {}: {}", a.name(), a.description())
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n\n## Handoffs\n\
             If another agent is better suited, transfer the task by answering:\n\
             Final Answer: {}AgentName|reason] input for that agent\n\n\
             Agents:\n{}",
            agent.instructions().trim(),
            HANDOFF_PREFIX,
            directory
        )
    }
}
