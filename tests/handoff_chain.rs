//! Handoff chain integration tests
//!
//! Multi-agent runs through the runtime built from a TOML config.

use std::sync::Arc;

use baton::handoff::{HandoffCodec, HandoffRequest};
use baton::llm::ScriptedProvider;
use baton::{Config, FailureKind, Runtime};
use tokio_util::sync::CancellationToken;

const CONFIG: &str = r#"
entry_agent = "Triage"

[ollama]
host = "localhost"
port = 11434
timeout_secs = 30

[model]
name = "qwen3:8b"
temperature = 0.0

[agent]
max_steps = 4
max_history = 100
debug = false

[handoff]
max_depth = 2
hop_timeout_secs = 60
total_timeout_secs = 300
allow_cycles = false
fallback_to_entry = true

[[agents]]
name = "Triage"
description = "Routes requests"
instructions = "Decide who should handle the request."

[[agents]]
name = "Billing"
description = "Refunds and invoices"
instructions = "Resolve billing issues."

[[agents]]
name = "Research"
description = "Looks things up"
instructions = "Find facts."
max_steps = 2
"#;

fn runtime(replies: &[&str]) -> (Runtime, Arc<ScriptedProvider>) {
    let config = Config::from_toml(CONFIG).unwrap();
    let provider = Arc::new(ScriptedProvider::with_replies(replies.iter().copied()));
    (Runtime::with_provider(config, provider.clone()).unwrap(), provider)
}

#[tokio::test]
async fn test_triage_hands_off_to_billing() {
    let (runtime, provider) = runtime(&[
        "Thought: this is about money\nFinal Answer: [HANDOFF:Billing|needs billing] please refund",
        "Final Answer: Refund issued",
    ]);
    let outcome = runtime
        .process("I was charged twice", &CancellationToken::new())
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.final_answer.as_deref(), Some("Refund issued"));
    assert_eq!(outcome.path(), "Triage -> Billing");
    assert_eq!(outcome.depth, 1);
    assert_eq!(outcome.handoffs[0].reason.as_deref(), Some("needs billing"));

    let requests = provider.requests();
    assert!(requests[1][0].content.starts_with("Resolve billing issues."));
    assert!(requests[1][1].content.starts_with("please refund"));
}

#[tokio::test]
async fn test_unknown_target_retries_entry_once() {
    let (runtime, _) = runtime(&[
        "[HANDOFF:Unknown] do it",
        "Final Answer: handled by triage",
    ]);
    let outcome = runtime.process("help", &CancellationToken::new()).await;

    assert!(outcome.success);
    assert!(outcome.fallback_used);
    assert_eq!(outcome.final_agent, "Triage");
    assert_eq!(outcome.hops.len(), 2);
}

#[tokio::test]
async fn test_every_step_is_kept_on_failure() {
    let (runtime, _) = runtime(&[
        "[HANDOFF:Research] find it",
        "Action: search\nAction Input: a",
        "Action: search\nAction Input: b",
        "Action: lookup\nAction Input: c",
        "Action: lookup\nAction Input: d",
        "Action: lookup\nAction Input: e",
        "Action: lookup\nAction Input: f",
    ]);
    let outcome = runtime.process("research", &CancellationToken::new()).await;

    assert!(!outcome.success);
    assert_eq!(outcome.failure, Some(FailureKind::FallbackExhausted));
    assert_eq!(outcome.hops.len(), 3);
    assert_eq!(outcome.hops[1].result.steps.len(), 2);
    assert_eq!(outcome.hops[2].result.steps.len(), 4);
    assert_eq!(outcome.total_steps(), 7);
    assert!(outcome.error.unwrap().contains("budget exceeded"));
}

#[tokio::test]
async fn test_cycle_never_repeats_an_agent() {
    let (runtime, _) = runtime(&[
        "[HANDOFF:Billing] yours",
        "[HANDOFF:triage] no, yours",
    ]);
    let outcome = runtime.process("ping pong", &CancellationToken::new()).await;

    assert_eq!(outcome.failure, Some(FailureKind::CycleDetected));
    assert_eq!(outcome.visited, vec!["Triage", "Billing"]);
}

#[tokio::test]
async fn test_encoded_request_round_trips_through_chain() {
    let request = HandoffRequest::new("Research", "summarize the paper").with_reason("needs sources");
    let encoded = request.to_text();
    let (runtime, _) = runtime(&[encoded.as_str(), "Final Answer: summary"]);
    let outcome = runtime.process("paper", &CancellationToken::new()).await;

    assert!(outcome.success);
    let decoded = HandoffCodec::decode(&encoded).unwrap();
    assert_eq!(outcome.handoffs[0], decoded);
    assert_eq!(outcome.hops[1].input, "summarize the paper");
}
