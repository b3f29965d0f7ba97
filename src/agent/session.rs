//! Execution record model
//!
//! Tracks one reasoning loop: the original input, the append-only list of
//! steps, and the terminal result handed back to the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::core::FailureKind;

/// State of one task invocation
#[derive(Debug, Clone)]
pub struct SessionContext {
    session_id: String,
    input: String,
    steps: Vec<Step>,
    max_steps: usize,
    /// Free-form values attached by the caller
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SessionContext {
    /// Create a new session; a zero budget is raised to one step
    pub fn new(input: impl Into<String>, max_steps: usize) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            input: input.into(),
            steps: Vec::new(),
            max_steps: max_steps.max(1),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata value
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Number the next appended step will carry
    pub fn next_step_number(&self) -> usize {
        self.steps.len() + 1
    }

    /// Check whether another step fits in the budget
    pub fn has_budget(&self) -> bool {
        self.steps.len() < self.max_steps
    }

    /// Append a step. Returns `false` and drops the step when the budget is spent.
    pub fn push_step(&mut self, step: Step) -> bool {
        if !self.has_budget() {
            return false;
        }
        self.steps.push(step);
        true
    }
}

/// One reasoning iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position in the session
    pub number: usize,
    /// Raw model output
    pub raw_output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

impl Step {
    pub fn new(number: usize, raw_output: impl Into<String>) -> Self {
        Self {
            number,
            raw_output: raw_output.into(),
            thought: None,
            action: None,
            action_input: None,
            observation: None,
        }
    }
}

/// Terminal value of a reasoning loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub session_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub steps: Vec<Step>,
    pub duration: Duration,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ExecutionResult {
    /// Successful result carrying the session's steps
    pub fn success(session: SessionContext, answer: impl Into<String>, duration: Duration) -> Self {
        let SessionContext {
            session_id,
            steps,
            metadata,
            ..
        } = session;
        Self {
            session_id,
            success: true,
            final_answer: Some(answer.into()),
            error: None,
            failure: None,
            steps,
            duration,
            metadata,
        }
    }

    /// Failed result carrying the session's steps
    pub fn failure(
        session: SessionContext,
        kind: FailureKind,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let SessionContext {
            session_id,
            steps,
            metadata,
            ..
        } = session;
        Self {
            session_id,
            success: false,
            final_answer: None,
            error: Some(error.into()),
            failure: Some(kind),
            steps,
            duration,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_budget() {
        let mut session = SessionContext::new("hello", 2);
        assert_eq!(session.next_step_number(), 1);
        assert!(session.push_step(Step::new(1, "a")));
        assert!(session.push_step(Step::new(2, "b")));
        assert!(!session.has_budget());
        assert!(!session.push_step(Step::new(3, "c")));
        assert_eq!(session.steps().len(), 2);
    }

    #[test]
    fn test_zero_budget_is_raised() {
        let session = SessionContext::new("hello", 0);
        assert_eq!(session.max_steps(), 1);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionContext::new("x", 1);
        let b = SessionContext::new("x", 1);
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn test_result_exactly_one_of_answer_or_error() {
        let ok = ExecutionResult::success(SessionContext::new("q", 3), "42", Duration::ZERO);
        assert!(ok.success && ok.final_answer.is_some() && ok.error.is_none());
        assert_eq!(ok.final_answer.as_deref(), Some("42"));

        let err = ExecutionResult::failure(
            SessionContext::new("q", 3),
            FailureKind::BudgetExceeded,
            "out of steps",
            Duration::ZERO,
        );
        assert!(!err.success && err.final_answer.is_none() && err.error.is_some());
        assert_eq!(err.failure, Some(FailureKind::BudgetExceeded));
    }
}
