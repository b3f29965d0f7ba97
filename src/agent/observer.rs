//! Execution observers
//!
//! Hooks called synchronously at fixed points of a run. The loop and the
//! orchestrator hold no counters of their own; anything that wants to count
//! or report plugs in here.

use crate::agent::session::{ExecutionResult, Step};

/// Receives progress notifications. All methods default to no-ops.
pub trait ExecutionObserver: Send + Sync {
    /// A reasoning step is about to call the model
    fn step_started(&self, _agent: &str, _session_id: &str, _step: usize) {}

    /// A step was appended to the session
    fn step_finished(&self, _agent: &str, _session_id: &str, _step: &Step) {}

    /// A reasoning loop reached a terminal state
    fn loop_finished(&self, _agent: &str, _result: &ExecutionResult) {}

    /// Control moved from one agent to another
    fn handoff(&self, _from: &str, _to: &str, _depth: usize) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {}

/// Observer that reports through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn step_started(&self, agent: &str, session_id: &str, step: usize) {
        tracing::debug!(agent, session_id, step, "step started");
    }

    fn step_finished(&self, agent: &str, session_id: &str, step: &Step) {
        tracing::info!(
            agent,
            session_id,
            step = step.number,
            action = step.action.as_deref().unwrap_or("-"),
            "step finished"
        );
    }

    fn loop_finished(&self, agent: &str, result: &ExecutionResult) {
        if result.success {
            tracing::info!(
                agent,
                session_id = %result.session_id,
                steps = result.steps.len(),
                elapsed_ms = result.duration.as_millis() as u64,
                "reasoning loop complete"
            );
        } else {
            tracing::warn!(
                agent,
                session_id = %result.session_id,
                steps = result.steps.len(),
                error = result.error.as_deref().unwrap_or_default(),
                "reasoning loop failed"
            );
        }
    }

    fn handoff(&self, from: &str, to: &str, depth: usize) {
        tracing::info!(from, to, depth, "handoff");
    }
}
